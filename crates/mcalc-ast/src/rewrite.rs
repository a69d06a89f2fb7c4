//! Generic tree-copy rewrites shared by the desugarer and canonicalizer
//! (§4.3, §4.4): replacing specific nodes by identity and hygienic
//! identifier substitution.
//!
//! Both utilities keep the original [`NodeId`] on every node whose children
//! are merely rebuilt around an unchanged or like-for-like-typed
//! replacement (a wrapper's type depends only on its children's types, and
//! a substitution always swaps in an expression of the same type as the
//! identifier it replaces). Callers that introduce genuinely new structure
//! (a fresh generator variable, a synthesized projection) allocate a fresh
//! `NodeId` themselves via `Builder` and are responsible for recording its
//! type in whatever side table the calling pass maintains.

use rustc_hash::FxHashMap;

use mcalc_common::Symbol;

use crate::expr::{Expr, ExprKind, ExprNode, OrderKey, RecordField, Select};
use crate::node_id::NodeId;
use crate::pattern::Qualifier;

/// Replace every node whose [`NodeId`] is a key of `replacements` with the
/// mapped expression; every other node is rebuilt with its children
/// recursively rewritten the same way.
#[must_use]
pub fn replace_by_id(e: &Expr, replacements: &FxHashMap<NodeId, Expr>) -> Expr {
    if let Some(r) = replacements.get(&e.id) {
        return r.clone();
    }
    map_children(e, &mut |c| replace_by_id(c, replacements))
}

/// Replace every `IdnExp(s)` with `s.id() == target.id()` by a clone of
/// `replacement` (§4.3 `ExpBlock` bind inlining, §4.4 bind inlining).
/// Symbols are globally unique per compile (§9 "Fresh symbols"), so this
/// can never capture an unrelated binding that merely shares a display
/// name.
#[must_use]
pub fn substitute_idn(e: &Expr, target: &Symbol, replacement: &Expr) -> Expr {
    if let ExprKind::IdnExp(s) = &e.kind {
        if s.id() == target.id() {
            return replacement.clone();
        }
    }
    map_children(e, &mut |c| substitute_idn(c, target, replacement))
}

/// Rebuild `e` with every direct and qualifier-list child passed through
/// `f`, keeping `e`'s own [`NodeId`] and span. Exposed for passes (the
/// desugarer, the canonicalizer) that need generic pass-through recursion
/// for the node kinds they don't special-case themselves.
#[must_use]
pub fn map_children(e: &Expr, f: &mut impl FnMut(&Expr) -> Expr) -> Expr {
    let kind = match &e.kind {
        ExprKind::BoolConst(_)
        | ExprKind::IntConst(_)
        | ExprKind::FloatConst(_)
        | ExprKind::StringConst(_)
        | ExprKind::IdnExp(_)
        | ExprKind::ZeroCollectionMonoid(_)
        | ExprKind::Partition
        | ExprKind::Star => return e.clone(),

        ExprKind::RecordProj(inner, field) => ExprKind::RecordProj(f(inner), field.clone()),
        ExprKind::RecordCons(fields) => ExprKind::RecordCons(
            fields
                .iter()
                .map(|rf| RecordField { idn: rf.idn.clone(), value: f(&rf.value) })
                .collect(),
        ),
        ExprKind::IfThenElse(c, t, e2) => ExprKind::IfThenElse(f(c), f(t), f(e2)),
        ExprKind::BinaryExp(op, l, r) => ExprKind::BinaryExp(*op, f(l), f(r)),
        ExprKind::UnaryExp(op, inner) => ExprKind::UnaryExp(*op, f(inner)),
        ExprKind::MergeMonoid(m, l, r) => ExprKind::MergeMonoid(m.clone(), f(l), f(r)),
        ExprKind::ConsCollectionMonoid(m, inner) => ExprKind::ConsCollectionMonoid(m.clone(), f(inner)),
        ExprKind::MultiCons(m, items) => {
            ExprKind::MultiCons(m.clone(), items.iter().map(|i| f(i)).collect())
        }
        ExprKind::Comp(m, qs, body) => ExprKind::Comp(m.clone(), map_qualifiers(qs, f), f(body)),
        ExprKind::Select(s) => ExprKind::Select(Box::new(Select {
            from: map_qualifiers(&s.from, f),
            distinct: s.distinct,
            group_by: s.group_by.as_ref().map(|g| f(g)),
            proj: f(&s.proj),
            where_: s.where_.as_ref().map(|w| f(w)),
            order_by: s
                .order_by
                .iter()
                .map(|k| OrderKey { expr: f(&k.expr), ascending: k.ascending })
                .collect(),
            having: s.having.as_ref().map(|h| f(h)),
        })),
        ExprKind::FunAbs(p, body) => ExprKind::FunAbs(p.clone(), f(body)),
        ExprKind::FunApp(fun, arg) => ExprKind::FunApp(f(fun), f(arg)),
        ExprKind::ExpBlock(binds, body) => ExprKind::ExpBlock(
            binds.iter().map(|(p, u)| (p.clone(), f(u))).collect(),
            f(body),
        ),
        ExprKind::Into(e1, e2) => ExprKind::Into(f(e1), f(e2)),
        ExprKind::Sum(inner) => ExprKind::Sum(f(inner)),
        ExprKind::Max(inner) => ExprKind::Max(f(inner)),
        ExprKind::Min(inner) => ExprKind::Min(f(inner)),
        ExprKind::Avg(inner) => ExprKind::Avg(f(inner)),
        ExprKind::Count(inner) => ExprKind::Count(f(inner)),
        ExprKind::Exists(inner) => ExprKind::Exists(f(inner)),
        ExprKind::InExp(e1, e2) => ExprKind::InExp(f(e1), f(e2)),
    };
    ExprNode::new(e.id, e.span, kind)
}

fn map_qualifiers(qs: &[Qualifier], f: &mut impl FnMut(&Expr) -> Expr) -> Vec<Qualifier> {
    qs.iter()
        .map(|q| match q {
            Qualifier::Gen(p, e) => Qualifier::Gen(p.clone(), f(e)),
            Qualifier::Bind(p, e) => Qualifier::Bind(p.clone(), f(e)),
            Qualifier::Exp(e) => Qualifier::Exp(f(e)),
        })
        .collect()
}

/// Walk every direct and nested subexpression of `e`, calling `visit` on
/// each node (including `e` itself) in no particular order. Used by passes
/// that need to collect information (free variables, nested comprehensions)
/// without rebuilding the tree.
pub fn walk(e: &Expr, visit: &mut impl FnMut(&Expr)) {
    visit(e);
    match &e.kind {
        ExprKind::BoolConst(_)
        | ExprKind::IntConst(_)
        | ExprKind::FloatConst(_)
        | ExprKind::StringConst(_)
        | ExprKind::IdnExp(_)
        | ExprKind::ZeroCollectionMonoid(_)
        | ExprKind::Partition
        | ExprKind::Star => {}
        ExprKind::RecordProj(inner, _) => walk(inner, visit),
        ExprKind::RecordCons(fields) => {
            for f in fields {
                walk(&f.value, visit);
            }
        }
        ExprKind::IfThenElse(c, t, f) => {
            walk(c, visit);
            walk(t, visit);
            walk(f, visit);
        }
        ExprKind::BinaryExp(_, l, r) => {
            walk(l, visit);
            walk(r, visit);
        }
        ExprKind::UnaryExp(_, inner) => walk(inner, visit),
        ExprKind::MergeMonoid(_, l, r) => {
            walk(l, visit);
            walk(r, visit);
        }
        ExprKind::ConsCollectionMonoid(_, inner) => walk(inner, visit),
        ExprKind::MultiCons(_, items) => {
            for i in items {
                walk(i, visit);
            }
        }
        ExprKind::Comp(_, qs, body) => {
            for q in qs {
                match q {
                    Qualifier::Gen(_, src) => walk(src, visit),
                    Qualifier::Bind(_, u) => walk(u, visit),
                    Qualifier::Exp(pred) => walk(pred, visit),
                }
            }
            walk(body, visit);
        }
        ExprKind::Select(s) => {
            for q in &s.from {
                if let Qualifier::Gen(_, src) = q {
                    walk(src, visit);
                }
            }
            if let Some(w) = &s.where_ {
                walk(w, visit);
            }
            if let Some(g) = &s.group_by {
                walk(g, visit);
            }
            if let Some(h) = &s.having {
                walk(h, visit);
            }
            for k in &s.order_by {
                walk(&k.expr, visit);
            }
            walk(&s.proj, visit);
        }
        ExprKind::FunAbs(_, body) => walk(body, visit),
        ExprKind::FunApp(fun, arg) => {
            walk(fun, visit);
            walk(arg, visit);
        }
        ExprKind::ExpBlock(binds, body) => {
            for (_, u) in binds {
                walk(u, visit);
            }
            walk(body, visit);
        }
        ExprKind::Into(e1, e2) => {
            walk(e1, visit);
            walk(e2, visit);
        }
        ExprKind::Sum(inner)
        | ExprKind::Max(inner)
        | ExprKind::Min(inner)
        | ExprKind::Avg(inner)
        | ExprKind::Count(inner)
        | ExprKind::Exists(inner) => walk(inner, visit),
        ExprKind::InExp(e1, e2) => {
            walk(e1, visit);
            walk(e2, visit);
        }
    }
}

/// Free `IdnExp` symbols in `e`, i.e. identifiers not bound by some
/// enclosing construct within `e` itself (used by C11/C12 hoisting's
/// independence check and by hygienic bind inlining).
#[must_use]
pub fn free_idns(e: &Expr) -> Vec<Symbol> {
    let mut bound = Vec::new();
    let mut free = Vec::new();
    collect_free(e, &mut bound, &mut free);
    free
}

fn collect_free(e: &Expr, bound: &mut Vec<Symbol>, free: &mut Vec<Symbol>) {
    match &e.kind {
        ExprKind::IdnExp(s) => {
            if !bound.iter().any(|b| b.id() == s.id()) && !free.iter().any(|b| b.id() == s.id()) {
                free.push(s.clone());
            }
        }
        ExprKind::Comp(_, qs, body) => {
            let mark = bound.len();
            for q in qs {
                match q {
                    Qualifier::Gen(p, src) => {
                        collect_free(src, bound, free);
                        if let Some(p) = p {
                            p.bound_idns(bound);
                        }
                    }
                    Qualifier::Bind(p, u) => {
                        collect_free(u, bound, free);
                        p.bound_idns(bound);
                    }
                    Qualifier::Exp(pred) => collect_free(pred, bound, free),
                }
            }
            collect_free(body, bound, free);
            bound.truncate(mark);
        }
        ExprKind::FunAbs(p, body) => {
            let mark = bound.len();
            p.bound_idns(bound);
            collect_free(body, bound, free);
            bound.truncate(mark);
        }
        ExprKind::ExpBlock(binds, body) => {
            let mark = bound.len();
            for (p, u) in binds {
                collect_free(u, bound, free);
                p.bound_idns(bound);
            }
            collect_free(body, bound, free);
            bound.truncate(mark);
        }
        _ => walk_direct_children(e, &mut |c| collect_free(c, bound, free)),
    }
}

fn walk_direct_children(e: &Expr, f: &mut impl FnMut(&Expr)) {
    match &e.kind {
        ExprKind::BoolConst(_)
        | ExprKind::IntConst(_)
        | ExprKind::FloatConst(_)
        | ExprKind::StringConst(_)
        | ExprKind::IdnExp(_)
        | ExprKind::ZeroCollectionMonoid(_)
        | ExprKind::Partition
        | ExprKind::Star => {}
        ExprKind::RecordProj(inner, _) => f(inner),
        ExprKind::RecordCons(fields) => fields.iter().for_each(|rf| f(&rf.value)),
        ExprKind::IfThenElse(c, t, e2) => {
            f(c);
            f(t);
            f(e2);
        }
        ExprKind::BinaryExp(_, l, r) => {
            f(l);
            f(r);
        }
        ExprKind::UnaryExp(_, inner) => f(inner),
        ExprKind::MergeMonoid(_, l, r) => {
            f(l);
            f(r);
        }
        ExprKind::ConsCollectionMonoid(_, inner) => f(inner),
        ExprKind::MultiCons(_, items) => items.iter().for_each(f),
        ExprKind::Select(s) => {
            for q in &s.from {
                if let Qualifier::Gen(_, src) = q {
                    f(src);
                }
            }
            s.where_.iter().for_each(|w| f(w));
            s.group_by.iter().for_each(|g| f(g));
            s.having.iter().for_each(|h| f(h));
            s.order_by.iter().for_each(|k| f(&k.expr));
            f(&s.proj);
        }
        ExprKind::FunApp(fun, arg) => {
            f(fun);
            f(arg);
        }
        ExprKind::Into(e1, e2) => {
            f(e1);
            f(e2);
        }
        ExprKind::Sum(inner)
        | ExprKind::Max(inner)
        | ExprKind::Min(inner)
        | ExprKind::Avg(inner)
        | ExprKind::Count(inner)
        | ExprKind::Exists(inner) => f(inner),
        ExprKind::InExp(e1, e2) => {
            f(e1);
            f(e2);
        }
        ExprKind::Comp(..) | ExprKind::FunAbs(..) | ExprKind::ExpBlock(..) => {
            unreachable!("binder forms are handled by collect_free directly")
        }
    }
}
