//! Beta-normalization (§4.4 "Beta-normalization"): `FunApp(FunAbs(p, body),
//! arg)` reduces by substituting `arg` for every identifier `p` binds in
//! `body`. The source describes this as "introducing a `Bind(p, arg)`
//! scoping `body`"; since the desugarer has already eliminated `ExpBlock`
//! as a standalone scoping construct (§4.3), the reduction is realized
//! directly as a substitution here rather than resynthesizing one, reusing
//! the same per-field destructuring a qualifier-list pattern bind uses.

use mcalc_ast::{Expr, ExprKind, Pattern};

use crate::CanonCtx;

/// Beta-reduce every redex in `e`, bottom-up, to a fixed point.
pub fn beta_reduce(e: &Expr, ctx: &mut CanonCtx) -> Expr {
    let rewritten = mcalc_ast::map_children(e, &mut |c| beta_reduce(c, ctx));
    match &rewritten.kind {
        ExprKind::FunApp(f, arg) => {
            if let ExprKind::FunAbs(p, body) = &f.kind {
                let reduced = substitute_pattern(p, arg, body, ctx);
                beta_reduce(&reduced, ctx)
            } else {
                rewritten
            }
        }
        _ => rewritten,
    }
}

/// Substitute `arg` for every identifier `p` binds within `body`,
/// destructuring `p` positionally against `arg`'s fields for a
/// `Pattern::Prod` via `_k`/field-name record projections.
pub(crate) fn substitute_pattern(p: &Pattern, arg: &Expr, body: &Expr, ctx: &mut CanonCtx) -> Expr {
    match p {
        Pattern::Idn(sym, _) => mcalc_ast::substitute_idn(body, sym, arg),
        Pattern::Prod(items, span) => {
            let arg_ty = ctx.type_of(arg);
            let fields = crate::record_fields_for(&arg_ty, items.len(), ctx);
            let mut out = body.clone();
            for (item, (field_sym, field_ty)) in items.iter().zip(fields.into_iter()) {
                let proj = ctx.builder.record_proj(arg.clone(), field_sym, *span);
                ctx.record_type(proj.id, field_ty);
                out = substitute_pattern(item, &proj, &out, ctx);
            }
            out
        }
    }
}
