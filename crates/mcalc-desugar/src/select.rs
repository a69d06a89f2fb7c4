//! `SELECT` lowering (§4.3 "SELECT"): both the `GROUP BY` and plain forms
//! reduce to a single `Comp`. `GROUP BY` additionally needs every
//! `partition` occurrence in `proj`/`having` replaced by a sub-query that
//! recomputes the group's rows by re-filtering the (alpha-renamed) `FROM`
//! clause against the outer row's group key - the partitioning of
//! identical keys into one another's group is then realized entirely by
//! the unnester's `Nest` rule (§4.5 rule C8) once this comprehension is
//! later normalized and unnested, not by anything built here (see
//! `DESIGN.md`).

use rustc_hash::FxHashMap;

use mcalc_ast::{BinaryOp, Entity, Expr, ExprKind, NodeId, Pattern, Qualifier, RecordField, Select};
use mcalc_common::{Span, Symbol};
use mcalc_types::{Monoid, RecordAttributes, Type};

use crate::DesugarCtx;

pub fn desugar_select(s: &Select, span: Span, ctx: &mut DesugarCtx, original_id: NodeId) -> Expr {
    match &s.group_by {
        Some(g) => desugar_group_by(s, g, span, ctx, original_id),
        None => desugar_plain(s, span, ctx, original_id),
    }
}

fn desugar_plain(s: &Select, span: Span, ctx: &mut DesugarCtx, original_id: NodeId) -> Expr {
    let qs = crate::desugar_qualifiers(&s.from, ctx);
    let mut qs_full = qs.clone();
    if let Some(w) = &s.where_ {
        qs_full.push(Qualifier::Exp(crate::desugar_expr(w, ctx)));
    }
    let proj = lower_star(&s.proj, &s.proj, &qs, ctx);
    let proj = crate::desugar_expr(&proj, ctx);
    let comp = ctx.builder.comp(select_monoid(original_id, ctx), qs_full, proj, span);
    ctx.record_type(comp.id, ctx.types.get(&original_id).cloned().unwrap_or(Type::AnyType));
    comp
}

fn desugar_group_by(
    s: &Select,
    group_by: &Expr,
    span: Span,
    ctx: &mut DesugarCtx,
    original_id: NodeId,
) -> Expr {
    let outer_from = crate::desugar_qualifiers(&s.from, ctx);
    let outer_where = s.where_.as_ref().map(|w| crate::desugar_expr(w, ctx));
    let outer_group_by = crate::desugar_expr(group_by, ctx);

    let (clone_from, subst) = alpha_rename_qualifiers(&outer_from, ctx);
    let clone_where = outer_where.as_ref().map(|w| rename_idns(w, &subst, ctx));
    let clone_group_by = rename_idns(&outer_group_by, &subst, ctx);

    let eq = ctx.builder.binary(BinaryOp::Eq, clone_group_by, outer_group_by.clone(), span);
    ctx.record_type(eq.id, Type::Bool);

    let mut sub_qs = clone_from.clone();
    if let Some(w) = clone_where {
        sub_qs.push(Qualifier::Exp(w));
    }
    sub_qs.push(Qualifier::Exp(eq));

    let partition_occurrences = find_partition_occurrences(&s.proj, &s.having, &s.proj, ctx);
    let partition_row_ty = partition_occurrences
        .first()
        .map(|(_, ty)| row_shape(ty))
        .unwrap_or(Type::AnyType);
    let row_expr = row_expr_for_generators(&clone_from, &partition_row_ty, span, ctx);
    let partition_value = ctx.builder.comp(Monoid::Bag, sub_qs, row_expr.clone(), span);
    ctx.record_type(partition_value.id, Type::collection(Monoid::Bag, partition_row_ty));

    let mut replacements: FxHashMap<NodeId, Expr> = FxHashMap::default();
    for (id, _) in &partition_occurrences {
        replacements.insert(*id, partition_value.clone());
    }

    let proj_substituted = mcalc_ast::replace_by_id(&s.proj, &replacements);
    let proj_substituted = lower_star(&proj_substituted, &s.proj, &outer_from, ctx);
    let proj = crate::desugar_expr(&proj_substituted, ctx);

    let mut final_qs = outer_from.clone();
    if let Some(w) = outer_where {
        final_qs.push(Qualifier::Exp(w));
    }
    if let Some(h) = &s.having {
        let h_substituted = mcalc_ast::replace_by_id(h, &replacements);
        let h_substituted = lower_star(&h_substituted, &s.proj, &outer_from, ctx);
        let h = crate::desugar_expr(&h_substituted, ctx);
        final_qs.push(Qualifier::Exp(h));
    }

    let comp = ctx.builder.comp(select_monoid(original_id, ctx), final_qs, proj, span);
    ctx.record_type(comp.id, ctx.types.get(&original_id).cloned().unwrap_or(Type::AnyType));
    comp
}

/// The outer collection monoid the analyzer assigned this `Select`
/// (`List` for `ORDER BY`, `Set` for `DISTINCT`, a fresh variable
/// otherwise, §4.2 `infer_select`). `ORDER BY`'s actual key-driven
/// ordering has no counterpart in the flat algebra's operator set and is
/// therefore only represented at the type level here, not as a physical
/// sort step (see `DESIGN.md`).
fn select_monoid(original_id: NodeId, ctx: &DesugarCtx) -> Monoid {
    crate::collection_monoid(&ctx.types.get(&original_id).cloned().unwrap_or(Type::AnyType))
        .unwrap_or(Monoid::Bag)
}

fn row_shape(ty: &Type) -> Type {
    match ty {
        Type::Collection(_, inner) => (**inner).clone(),
        other => other.clone(),
    }
}

/// Every `Partition` node under `proj`/`having` whose entity anchor is
/// `select_proj_anchor` - i.e. belongs to this `Select`, not some more
/// deeply nested one that shadows it (§3.4 scope chains: a nested
/// `Select`'s own `partition` carries its own anchor).
fn find_partition_occurrences(
    proj: &Expr,
    having: &Option<Expr>,
    select_proj_anchor: &Expr,
    ctx: &DesugarCtx,
) -> Vec<(NodeId, Type)> {
    let mut out = Vec::new();
    let mut collect = |e: &Expr| {
        if matches!(e.kind, ExprKind::Partition) {
            if let Some(Entity::Partition(a, ty)) = ctx.entities.get(&e.id) {
                if a.id == select_proj_anchor.id {
                    out.push((e.id, ty.clone()));
                }
            }
        }
    };
    mcalc_ast::walk(proj, &mut collect);
    if let Some(h) = having {
        mcalc_ast::walk(h, &mut collect);
    }
    out
}

/// Lower every `Star` node in `e` whose entity anchor is
/// `select_proj_anchor` into the concrete row expression the analyzer's
/// `selectStarType` resolved it to (§4.2), built from `from_for_row`'s
/// bound generator identifiers.
fn lower_star(e: &Expr, select_proj_anchor: &Expr, from_for_row: &[Qualifier], ctx: &mut DesugarCtx) -> Expr {
    let mut targets: Vec<(NodeId, Type)> = Vec::new();
    mcalc_ast::walk(e, &mut |n| {
        if matches!(n.kind, ExprKind::Star) {
            if let Some(Entity::Star(a, ty)) = ctx.entities.get(&n.id) {
                if a.id == select_proj_anchor.id {
                    targets.push((n.id, ty.clone()));
                }
            }
        }
    });
    if targets.is_empty() {
        return e.clone();
    }
    let mut replacements = FxHashMap::default();
    for (id, ty) in targets {
        let span = Span::synthetic();
        let row = row_expr_for_generators(from_for_row, &row_shape(&ty), span, ctx);
        replacements.insert(id, row);
    }
    mcalc_ast::replace_by_id(e, &replacements)
}

/// The row value `*`/`partition` resolve to: the sole bound generator
/// identifier when there is exactly one, or a record with one field per
/// generator otherwise, field names/types drawn from `row_ty` (already
/// resolved by the analyzer, §4.2 `selectStarType`/`selectPartitionType`).
#[must_use]
fn row_expr_for_generators(qs: &[Qualifier], row_ty: &Type, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let gens: Vec<Expr> = qs
        .iter()
        .filter_map(|q| match q {
            Qualifier::Gen(Some(Pattern::Idn(sym, _)), _) => Some(ctx.builder.idn(sym.clone(), span)),
            _ => None,
        })
        .collect();
    if gens.len() == 1 {
        let idn = gens.into_iter().next().unwrap();
        ctx.record_type(idn.id, row_ty.clone());
        return idn;
    }
    if let Type::Record(atts) = row_ty {
        if let RecordAttributes::Attributes(fields) = atts.as_ref() {
            if fields.len() == gens.len() {
                let record_fields: Vec<RecordField> = fields
                    .iter()
                    .zip(gens.into_iter())
                    .map(|(a, idn)| {
                        ctx.record_type(idn.id, a.ty.clone());
                        RecordField { idn: a.idn.clone(), value: idn }
                    })
                    .collect();
                let rc = ctx.builder.mk(span, ExprKind::RecordCons(record_fields));
                ctx.record_type(rc.id, row_ty.clone());
                return rc;
            }
        }
    }
    let rc = ctx.builder.mk(span, ExprKind::RecordCons(Vec::new()));
    ctx.record_type(rc.id, row_ty.clone());
    rc
}

/// Clone `qs` with every bound identifier replaced by a fresh symbol, so
/// the clone can be re-embedded as an independent sub-query without
/// colliding with the outer scope's bindings of the same name (§4.3
/// "SELECT ... GROUP BY"). Every qualifier at this point binds a plain
/// `Pattern::Idn` - `Pattern::Prod`/anonymous generators were already
/// normalized away by [`crate::desugar_qualifiers`] before this runs.
fn alpha_rename_qualifiers(qs: &[Qualifier], ctx: &mut DesugarCtx) -> (Vec<Qualifier>, FxHashMap<u32, Symbol>) {
    let mut subst: FxHashMap<u32, Symbol> = FxHashMap::default();
    let mut out = Vec::new();
    for q in qs {
        match q {
            Qualifier::Gen(Some(Pattern::Idn(sym, pspan)), src) => {
                let src2 = rename_idns(src, &subst, ctx);
                let fresh = ctx.builder.fresh_sym(sym.name());
                subst.insert(sym.id(), fresh.clone());
                out.push(Qualifier::Gen(Some(Pattern::Idn(fresh, *pspan)), src2));
            }
            Qualifier::Gen(None, src) => out.push(Qualifier::Gen(None, rename_idns(src, &subst, ctx))),
            Qualifier::Bind(Pattern::Idn(sym, pspan), u) => {
                let u2 = rename_idns(u, &subst, ctx);
                let fresh = ctx.builder.fresh_sym(sym.name());
                subst.insert(sym.id(), fresh.clone());
                out.push(Qualifier::Bind(Pattern::Idn(fresh, *pspan), u2));
            }
            Qualifier::Bind(pat, u) => out.push(Qualifier::Bind(pat.clone(), rename_idns(u, &subst, ctx))),
            Qualifier::Exp(pred) => out.push(Qualifier::Exp(rename_idns(pred, &subst, ctx))),
        }
    }
    (out, subst)
}

/// Rebuild `e`, replacing every `IdnExp` bound to an old symbol id in
/// `subst` by a fresh `IdnExp` of the renamed symbol with the same
/// recorded type.
fn rename_idns(e: &Expr, subst: &FxHashMap<u32, Symbol>, ctx: &mut DesugarCtx) -> Expr {
    if let ExprKind::IdnExp(s) = &e.kind {
        if let Some(fresh) = subst.get(&s.id()) {
            let ty = ctx.type_of(e);
            let idn = ctx.builder.idn(fresh.clone(), e.span);
            ctx.record_type(idn.id, ty);
            return idn;
        }
    }
    mcalc_ast::map_children(e, &mut |c| rename_idns(c, subst, ctx))
}
