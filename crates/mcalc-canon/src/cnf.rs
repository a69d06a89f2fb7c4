//! CNF predicate construction (§4.4 "CNF predicates"): every boolean
//! qualifier left over after bind inlining is conjoined into one predicate,
//! then rewritten into conjunctive normal form by pushing negations to the
//! leaves (De Morgan) and distributing `Or` over `And`.

use mcalc_ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use mcalc_common::Span;
use mcalc_types::Type;

use crate::CanonCtx;

/// AND together every predicate in `preds` (the `true` constant if empty,
/// so a generator-only comprehension still carries a well-formed trailing
/// predicate) and reduce the result to CNF.
pub fn conjoin_cnf(preds: &[Expr], span: Span, ctx: &mut CanonCtx) -> Expr {
    let Some((first, rest)) = preds.split_first() else {
        let t = ctx.builder.bool_const(true, span);
        ctx.record_type(t.id, Type::Bool);
        return t;
    };
    let mut combined = first.clone();
    for p in rest {
        combined = and_join(combined, p.clone(), span, ctx);
    }
    to_cnf(&combined, ctx)
}

/// Rewrite `e` into CNF: push `Not` inward to the leaves, then distribute
/// any `Or` over an `And` in either operand.
fn to_cnf(e: &Expr, ctx: &mut CanonCtx) -> Expr {
    match &e.kind {
        ExprKind::UnaryExp(UnaryOp::Not, inner) => to_cnf(&push_negation_of(inner, ctx), ctx),
        ExprKind::BinaryExp(BinaryOp::And, l, r) => {
            let l = to_cnf(l, ctx);
            let r = to_cnf(r, ctx);
            and_join(l, r, e.span, ctx)
        }
        ExprKind::BinaryExp(BinaryOp::Or, l, r) => {
            let l = to_cnf(l, ctx);
            let r = to_cnf(r, ctx);
            distribute_or(&l, &r, e.span, ctx)
        }
        _ => e.clone(),
    }
}

/// Compute `¬e`, pushed inward via De Morgan's laws (not yet distributed
/// into CNF - the caller re-enters [`to_cnf`] on the result).
fn push_negation_of(e: &Expr, ctx: &mut CanonCtx) -> Expr {
    match &e.kind {
        ExprKind::UnaryExp(UnaryOp::Not, inner) => (**inner).clone(),
        ExprKind::BinaryExp(BinaryOp::And, l, r) => {
            let nl = push_negation_of(l, ctx);
            let nr = push_negation_of(r, ctx);
            or_join(nl, nr, e.span, ctx)
        }
        ExprKind::BinaryExp(BinaryOp::Or, l, r) => {
            let nl = push_negation_of(l, ctx);
            let nr = push_negation_of(r, ctx);
            and_join(nl, nr, e.span, ctx)
        }
        _ => negate(e, ctx),
    }
}

/// `Or` distributes over whichever operand is (still, or again) an `And`,
/// recursing until neither side is a conjunction.
fn distribute_or(a: &Expr, b: &Expr, span: Span, ctx: &mut CanonCtx) -> Expr {
    if let ExprKind::BinaryExp(BinaryOp::And, l, r) = &a.kind {
        let left = distribute_or(l, b, span, ctx);
        let right = distribute_or(r, b, span, ctx);
        return and_join(left, right, span, ctx);
    }
    if let ExprKind::BinaryExp(BinaryOp::And, l, r) = &b.kind {
        let left = distribute_or(a, l, span, ctx);
        let right = distribute_or(a, r, span, ctx);
        return and_join(left, right, span, ctx);
    }
    or_join(a.clone(), b.clone(), span, ctx)
}

fn negate(e: &Expr, ctx: &mut CanonCtx) -> Expr {
    let n = ctx.builder.unary(UnaryOp::Not, e.clone(), e.span);
    ctx.record_type(n.id, Type::Bool);
    n
}

fn and_join(l: Expr, r: Expr, span: Span, ctx: &mut CanonCtx) -> Expr {
    let e = ctx.builder.binary(BinaryOp::And, l, r, span);
    ctx.record_type(e.id, Type::Bool);
    e
}

fn or_join(l: Expr, r: Expr, span: Span, ctx: &mut CanonCtx) -> Expr {
    let e = ctx.builder.binary(BinaryOp::Or, l, r, span);
    ctx.record_type(e.id, Type::Bool);
    e
}

/// Flatten a (not necessarily CNF) conjunction into its top-level
/// conjuncts. Used by `mcalc-unnest`'s predicate splitting (§4.5
/// `splitPredicate`), which needs to classify each clause of an already-CNF
/// predicate independently.
#[must_use]
pub fn collect_conjuncts(e: &Expr) -> Vec<Expr> {
    match &e.kind {
        ExprKind::BinaryExp(BinaryOp::And, l, r) => {
            let mut out = collect_conjuncts(l);
            out.extend(collect_conjuncts(r));
            out
        }
        _ => vec![e.clone()],
    }
}

/// Flatten a (not necessarily CNF) disjunction into its top-level
/// disjuncts, the dual of [`collect_conjuncts`] for inspecting one clause
/// of a CNF predicate.
#[must_use]
pub fn collect_disjuncts(e: &Expr) -> Vec<Expr> {
    match &e.kind {
        ExprKind::BinaryExp(BinaryOp::Or, l, r) => {
            let mut out = collect_disjuncts(l);
            out.extend(collect_disjuncts(r));
            out
        }
        _ => vec![e.clone()],
    }
}

#[cfg(test)]
#[path = "tests/cnf.rs"]
mod tests;
