//! Desugarers (§4.3): the ordered reduction pipeline that turns surface
//! sugar (implicit blocks, pattern binds, `Sum`/`Max`/.../`Exists`/`In`,
//! `SELECT` with or without `GROUP BY`, anonymous generators) into plain
//! comprehensions for `mcalc-canon` to normalize further.
//!
//! Runs in two stages (see `DESIGN.md` for why anonymous-generator
//! elimination must go first): (1) [`anon::eliminate`] rewrites every
//! `Gen(None, e)`/`Into(e1, e2)` implicit field reference into an explicit
//! `RecordProj`, using the analyzer's entity table over the *surface* tree;
//! (2) a single bottom-up [`desugar_expr`] pass eliminates blocks, sugar
//! operators, and `SELECT`. One bottom-up pass reaches the fixed point
//! because every rule only fires once its own subexpressions already carry
//! no sugar, and the one construct a rule synthesizes afresh (the `GROUP
//! BY` partition subquery) is built directly in already-desugared shape
//! rather than through another sugar node.

use std::rc::Rc;

use mcalc_analyzer::AnalysisResult;
use mcalc_ast::{Builder, Entity, Expr, ExprKind, NodeId, NodeIdGenerator, Pattern, Qualifier};
use mcalc_common::{Span, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};
use rustc_hash::FxHashMap;

mod anon;
mod blocks;
mod select;
mod sugar;

/// Threaded through every desugar rule: the fresh-node builder plus the
/// side tables a rewrite needs to consult or extend. `types`/`entities`
/// start as the analyzer's output over the surface tree (§4.2) and grow one
/// entry per freshly synthesized node as desugaring proceeds, so a
/// downstream pass can still ask "what type is this node" for any node it
/// encounters, old or new.
pub struct DesugarCtx {
    pub builder: Builder,
    pub symbols: Rc<SymbolGenerator>,
    pub types: FxHashMap<NodeId, Type>,
    pub entities: FxHashMap<NodeId, Entity>,
}

impl DesugarCtx {
    #[must_use]
    pub fn type_of(&self, e: &Expr) -> Type {
        self.types.get(&e.id).cloned().unwrap_or(Type::AnyType)
    }

    pub fn record_type(&mut self, id: NodeId, ty: Type) {
        self.types.insert(id, ty);
    }
}

pub struct DesugarResult {
    pub expr: Expr,
    pub types: FxHashMap<NodeId, Type>,
}

/// Top-level entry point (§2 item 4).
pub fn desugar(
    root: &Expr,
    analysis: &AnalysisResult,
    ids: Rc<NodeIdGenerator>,
    symbols: Rc<SymbolGenerator>,
) -> DesugarResult {
    let mut ctx = DesugarCtx {
        builder: Builder::new(ids, symbols.clone()),
        symbols,
        types: analysis.types.clone(),
        entities: analysis.entities.clone(),
    };
    tracing::debug!("desugar: eliminating anonymous generators");
    let anon_free = anon::eliminate(root, &mut ctx);
    tracing::debug!("desugar: reducing sugar operators, blocks, and SELECT");
    let expr = desugar_expr(&anon_free, &mut ctx);
    DesugarResult { expr, types: ctx.types }
}

/// The single bottom-up rewrite of stage (2). Children are always
/// desugared first; every special case below therefore only ever looks at
/// already-desugared subexpressions (except where it needs a fact - like
/// "is this a Set" - recorded by the analyzer against an *original* node
/// id, which remains valid since entries are never removed from
/// `ctx.types`).
pub(crate) fn desugar_expr(e: &Expr, ctx: &mut DesugarCtx) -> Expr {
    match &e.kind {
        ExprKind::ExpBlock(binds, body) => {
            let binds: Vec<(Pattern, Expr)> =
                binds.iter().map(|(p, u)| (p.clone(), desugar_expr(u, ctx))).collect();
            let body = desugar_expr(body, ctx);
            blocks::desugar_expblock(binds, body, ctx)
        }

        ExprKind::Sum(inner) => sugar::desugar_sum(inner, e.span, ctx),
        ExprKind::Max(inner) => sugar::desugar_extremum(inner, Monoid::Max, e.span, ctx),
        ExprKind::Min(inner) => sugar::desugar_extremum(inner, Monoid::Min, e.span, ctx),
        ExprKind::Avg(inner) => sugar::desugar_avg(inner, e.span, ctx),
        ExprKind::Count(inner) => sugar::desugar_count(inner, e.span, ctx),
        ExprKind::Exists(inner) => sugar::desugar_exists(inner, e.span, ctx),
        ExprKind::InExp(e1, e2) => sugar::desugar_in(e1, e2, e.span, ctx),

        ExprKind::Comp(m, qs, body) => {
            let qs = desugar_qualifiers(qs, ctx);
            let body = desugar_expr(body, ctx);
            let out = ctx.builder.comp(m.clone(), qs, body, e.span);
            ctx.record_type(out.id, ctx.type_of(e));
            out
        }

        ExprKind::Select(s) => select::desugar_select(s, e.span, ctx, e.id),

        _ => mcalc_ast::map_children(e, &mut |c| desugar_expr(c, ctx)),
    }
}

pub(crate) fn desugar_qualifiers(qs: &[Qualifier], ctx: &mut DesugarCtx) -> Vec<Qualifier> {
    let mut out = Vec::new();
    for q in qs {
        out.extend(desugar_qualifier(q, ctx));
    }
    out
}

/// Desugar one qualifier, expanding a `Pattern::Prod` generator into a
/// plain-pattern generator plus a trailing bind (§4.3 "Blocks & patterns",
/// pattern generators), and a `Pattern::Prod` bind into one bind per field
/// (same section, shared with [`blocks::desugar_expblock`]).
pub(crate) fn desugar_qualifier(q: &Qualifier, ctx: &mut DesugarCtx) -> Vec<Qualifier> {
    match q {
        Qualifier::Gen(Some(orig_pat @ Pattern::Prod(_, span)), src) => {
            let span = *span;
            let orig_pat = orig_pat.clone();
            let src = desugar_expr(src, ctx);
            let elem_ty = collection_inner(&ctx.type_of(&src));
            let (fresh_sym, fresh_pat) = ctx.builder.fresh_idn_pattern("p", span);
            let idn = ctx.builder.idn(fresh_sym, span);
            ctx.record_type(idn.id, elem_ty);
            let mut out = vec![Qualifier::Gen(Some(fresh_pat), src)];
            out.extend(
                blocks::expand_pattern_bind(&orig_pat, &idn, ctx)
                    .into_iter()
                    .map(|(p, u)| Qualifier::Bind(p, u)),
            );
            out
        }
        Qualifier::Gen(pat, src) => vec![Qualifier::Gen(pat.clone(), desugar_expr(src, ctx))],
        Qualifier::Bind(pat, u) => {
            let u = desugar_expr(u, ctx);
            blocks::expand_pattern_bind(pat, &u, ctx)
                .into_iter()
                .map(|(p, v)| Qualifier::Bind(p, v))
                .collect()
        }
        Qualifier::Exp(pred) => vec![Qualifier::Exp(desugar_expr(pred, ctx))],
    }
}

// -- shared type-shape helpers, used by every submodule -------------------

pub(crate) fn collection_inner(ty: &Type) -> Type {
    match ty {
        Type::Collection(_, inner) => (**inner).clone(),
        _ => Type::AnyType,
    }
}

pub(crate) fn collection_monoid(ty: &Type) -> Option<Monoid> {
    match ty {
        Type::Collection(m, _) => Some(m.clone()),
        _ => None,
    }
}

/// `field`'s type within `ty`, assuming `ty` is a resolved `Record` -
/// falls back to `AnyType` for an unresolved/open record (best-effort,
/// consistent with §7's "failed unification installs a best-effort ...
/// substitution" recovery policy).
pub(crate) fn field_type(ty: &Type, field: &mcalc_common::Symbol) -> Type {
    if let Type::Record(atts) = ty {
        if let Some(a) = atts.find_attribute(field.name()) {
            return a.ty.clone();
        }
    }
    Type::AnyType
}

/// `record_field_names_or_positional`: the `k` field names of a record
/// type's resolved `Attributes`, or synthetic `_1.._n` symbols when the
/// type isn't (yet) a closed record - e.g. a `Pattern` product type from a
/// `FunAbs` parameter (§4.3 "Pattern binds ... expand record destructuring
/// into one Bind per field via `_k` projection").
pub(crate) fn record_fields(ty: &Type, arity: usize, ctx: &DesugarCtx) -> Vec<(mcalc_common::Symbol, Type)> {
    if let Type::Record(atts) = ty {
        if let RecordAttributes::Attributes(fields) = atts.as_ref() {
            return fields.iter().map(|a| (a.idn.clone(), a.ty.clone())).collect();
        }
    }
    (1..=arity)
        .map(|k| (ctx.symbols.declare(format!("_{k}")), Type::AnyType))
        .collect()
}

#[allow(dead_code)]
pub(crate) fn record_type_of(fields: &[Attribute]) -> Type {
    Type::record(RecordAttributes::Attributes(fields.to_vec()))
}

pub(crate) fn dummy_span() -> Span {
    Span::synthetic()
}

#[cfg(test)]
#[path = "tests/desugar.rs"]
mod tests;
