//! Expression and path translation (§4.5 "Expression and path
//! translation"): turns a canonical calculus expression into an algebra
//! expression by replacing every variable use with a positional
//! `Argument`, mapping primitive monoids/types one-to-one, and rejecting
//! constructs that must already have been eliminated by this point
//! (nested comprehensions, collection monoids in arithmetic position).

use mcalc_ast::{Expr, ExprKind};
use mcalc_common::CalculusError;
use mcalc_types::Monoid;

use crate::algebra::AlgExpr;
use crate::pattern::Pattern;
use crate::UnnestCtx;

/// Translate `e` into an [`AlgExpr`] whose `Argument`s are resolved
/// against `pattern`. Fails with `InternalError` if `e` still contains a
/// construct the driver should have eliminated before calling this (a
/// nested `Comp`, a `Select`, a sugar node) - those are bugs in an earlier
/// pass, not user errors (§4.5 "Failure semantics").
pub fn translate_expr(e: &Expr, pattern: &Pattern, ctx: &UnnestCtx) -> Result<AlgExpr, CalculusError> {
    let ty = ctx.type_of(e);
    match &e.kind {
        ExprKind::BoolConst(b) => Ok(AlgExpr::BoolConst(*b)),
        ExprKind::IntConst(i) => Ok(AlgExpr::IntConst(*i)),
        ExprKind::FloatConst(f) => Ok(AlgExpr::FloatConst(*f)),
        ExprKind::StringConst(s) => Ok(AlgExpr::StringConst(s.clone())),

        ExprKind::IdnExp(sym) => {
            let idx = pattern.index_of(sym).ok_or_else(|| CalculusError::InternalError {
                message: format!(
                    "unnester: identifier `{sym}` is free at an algebra node that doesn't bind it"
                ),
                pos: e.span,
            })?;
            Ok(AlgExpr::Argument(ty, idx))
        }

        ExprKind::RecordProj(inner, field) => {
            Ok(AlgExpr::RecordProj(Box::new(translate_expr(inner, pattern, ctx)?), field.clone()))
        }

        ExprKind::RecordCons(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for f in fields {
                out.push((f.idn.clone(), translate_expr(&f.value, pattern, ctx)?));
            }
            Ok(AlgExpr::RecordCons(out))
        }

        ExprKind::IfThenElse(c, t, f) => Ok(AlgExpr::IfThenElse(
            Box::new(translate_expr(c, pattern, ctx)?),
            Box::new(translate_expr(t, pattern, ctx)?),
            Box::new(translate_expr(f, pattern, ctx)?),
        )),

        ExprKind::BinaryExp(op, l, r) => Ok(AlgExpr::BinaryExp(
            *op,
            Box::new(translate_expr(l, pattern, ctx)?),
            Box::new(translate_expr(r, pattern, ctx)?),
        )),

        ExprKind::UnaryExp(op, inner) => {
            Ok(AlgExpr::UnaryExp(*op, Box::new(translate_expr(inner, pattern, ctx)?)))
        }

        ExprKind::MergeMonoid(m, l, r) => {
            reject_collection_monoid_in_arithmetic(m, e, ctx)?;
            Ok(AlgExpr::MergeMonoid(
                m.clone(),
                Box::new(translate_expr(l, pattern, ctx)?),
                Box::new(translate_expr(r, pattern, ctx)?),
            ))
        }

        ExprKind::ZeroCollectionMonoid(m) => Ok(AlgExpr::ZeroCollectionMonoid(m.clone())),

        ExprKind::ConsCollectionMonoid(m, inner) => {
            Ok(AlgExpr::ConsCollectionMonoid(m.clone(), Box::new(translate_expr(inner, pattern, ctx)?)))
        }

        ExprKind::MultiCons(m, items) => {
            let mut out = Vec::with_capacity(items.len());
            for i in items {
                out.push(translate_expr(i, pattern, ctx)?);
            }
            Ok(AlgExpr::MultiCons(m.clone(), out))
        }

        ExprKind::Comp(..) => Err(CalculusError::InternalError {
            message: "unnester: a nested comprehension reached expression translation without being hoisted first".into(),
            pos: e.span,
        }),

        other => Err(CalculusError::InternalError {
            message: format!("unnester: unexpected construct in algebra position: {other:?}"),
            pos: e.span,
        }),
    }
}

/// §4.5 "rejecting constructs ... collection monoids in arithmetic
/// positions": a `MergeMonoid` combining two *collection* values is fine
/// (it's how `Unnest`/`Nest` express union internally at the calculus
/// level before translation), but by the time an expression reaches
/// arithmetic/algebra-expression position its monoid must be primitive.
fn reject_collection_monoid_in_arithmetic(m: &Monoid, e: &Expr, ctx: &UnnestCtx) -> Result<(), CalculusError> {
    if m.is_collection() && !matches!(ctx.type_of(e), mcalc_types::Type::Collection(..)) {
        return Err(CalculusError::InternalError {
            message: "unnester: collection monoid used in a non-collection (arithmetic) position".into(),
            pos: e.span,
        });
    }
    Ok(())
}
