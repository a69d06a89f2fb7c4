//! Blocks & patterns (§4.3): `ExpBlock` bind inlining and record-destructuring
//! pattern expansion, shared between `ExpBlock`'s own binds and a
//! comprehension/`Select.from` qualifier's `Bind`/pattern-generator.

use mcalc_ast::{Expr, Pattern};

use crate::DesugarCtx;

/// Expand one pattern bind `(pat, u)` into a list of `(Pattern::Idn, expr)`
/// pairs, one per leaf identifier, substituting `_k`/field-name
/// `RecordProj`s for every `Pattern::Prod` level (§4.3 "Pattern binds").
/// `u` must already be desugared.
pub fn expand_pattern_bind(pat: &Pattern, u: &Expr, ctx: &mut DesugarCtx) -> Vec<(Pattern, Expr)> {
    match pat {
        Pattern::Idn(..) => vec![(pat.clone(), u.clone())],
        Pattern::Prod(items, span) => {
            let u_ty = ctx.type_of(u);
            let fields = crate::record_fields(&u_ty, items.len(), ctx);
            let mut out = Vec::new();
            for (item, (field_sym, field_ty)) in items.iter().zip(fields.into_iter()) {
                let proj = ctx.builder.record_proj(u.clone(), field_sym, *span);
                ctx.record_type(proj.id, field_ty);
                out.extend(expand_pattern_bind(item, &proj, ctx));
            }
            out
        }
    }
}

/// Inline an `ExpBlock`'s binds into its body and into the remaining binds
/// that follow, one at a time, left to right (§4.3 "Blocks"). An
/// `ExpBlock` is purely a `let`-sequence scoping device; once every bind
/// has been substituted away, what remains is just the (already desugared)
/// body. `binds`/`body` are assumed already desugared by the caller.
pub fn desugar_expblock(binds: Vec<(Pattern, Expr)>, body: Expr, ctx: &mut DesugarCtx) -> Expr {
    let Some((pat, u)) = binds.first().cloned() else {
        return body;
    };
    let rest = binds[1..].to_vec();
    match pat {
        Pattern::Idn(sym, _) => {
            let rest: Vec<(Pattern, Expr)> = rest
                .into_iter()
                .map(|(p, ue)| (p, mcalc_ast::substitute_idn(&ue, &sym, &u)))
                .collect();
            let body = mcalc_ast::substitute_idn(&body, &sym, &u);
            desugar_expblock(rest, body, ctx)
        }
        Pattern::Prod(..) => {
            let mut expanded = expand_pattern_bind(&pat, &u, ctx);
            expanded.extend(rest);
            desugar_expblock(expanded, body, ctx)
        }
    }
}
