//! Anonymous generators (§4.3 "Anonymous generators", §3.4 alias
//! environment): every `Gen(None, e)`/`Into(e1, e2)` implicitly injects its
//! record fields as identifiers into the rest of its scope. The analyzer
//! already resolved each such identifier to an [`Entity::GenAttribute`]/
//! [`Entity::IntoAttribute`] over the *surface* tree; this pass turns that
//! resolution into explicit syntax - a fresh bound variable plus
//! `RecordProj` - so every later pass only ever sees named generators.
//!
//! Runs once, first, over the whole tree (see `mod.rs`/`lib.rs`): later
//! desugar rules recurse bottom-up and would otherwise have to special-case
//! anonymous generators at every site that introduces a new nested scope.

use rustc_hash::FxHashMap;

use mcalc_ast::{Entity, Expr, ExprKind, ExprNode, NodeId, OrderKey, Pattern, Qualifier, Select};
use mcalc_common::Symbol;

use crate::DesugarCtx;

pub fn eliminate(root: &Expr, ctx: &mut DesugarCtx) -> Expr {
    let entities: Vec<(NodeId, Entity)> = ctx.entities.iter().map(|(id, e)| (*id, e.clone())).collect();

    let mut gen_anchors: FxHashMap<NodeId, Symbol> = FxHashMap::default();
    let mut field_replacements: FxHashMap<NodeId, Expr> = FxHashMap::default();

    for (node_id, entity) in &entities {
        match entity {
            Entity::GenAttribute(field, anchor, _idx) => {
                let fresh = gen_anchors
                    .entry(anchor.id)
                    .or_insert_with(|| ctx.builder.fresh_sym("g"))
                    .clone();
                let span = anchor.span;
                let elem_ty = crate::collection_inner(&ctx.type_of(anchor));
                let idn = ctx.builder.idn(fresh, span);
                ctx.record_type(idn.id, elem_ty.clone());
                let field_ty = crate::field_type(&elem_ty, field);
                let proj = ctx.builder.record_proj(idn, field.clone(), span);
                ctx.record_type(proj.id, field_ty);
                field_replacements.insert(*node_id, proj);
            }
            Entity::IntoAttribute(field, anchor, _idx) => {
                let anchor_ty = ctx.type_of(anchor);
                let field_ty = crate::field_type(&anchor_ty, field);
                let proj = ctx.builder.record_proj(anchor.clone(), field.clone(), anchor.span);
                ctx.record_type(proj.id, field_ty);
                field_replacements.insert(*node_id, proj);
            }
            _ => {}
        }
    }

    // `Into`-injected references copy the `e1` subtree bodily at every use
    // site; a field reference chained through nested `Into`s needs a few
    // rounds to fully resolve the copies this introduces.
    let mut tree = root.clone();
    for _ in 0..3 {
        tree = mcalc_ast::replace_by_id(&tree, &field_replacements);
    }

    retag(&tree, &gen_anchors)
}

fn retag(e: &Expr, anchors: &FxHashMap<NodeId, Symbol>) -> Expr {
    match &e.kind {
        ExprKind::Comp(m, qs, body) => {
            let qs2 = retag_qualifiers(qs, anchors);
            let body2 = retag(body, anchors);
            ExprNode::new(e.id, e.span, ExprKind::Comp(m.clone(), qs2, body2))
        }
        ExprKind::Select(s) => {
            let select = Select {
                from: retag_qualifiers(&s.from, anchors),
                distinct: s.distinct,
                group_by: s.group_by.as_ref().map(|g| retag(g, anchors)),
                proj: retag(&s.proj, anchors),
                where_: s.where_.as_ref().map(|w| retag(w, anchors)),
                order_by: s
                    .order_by
                    .iter()
                    .map(|k| OrderKey { expr: retag(&k.expr, anchors), ascending: k.ascending })
                    .collect(),
                having: s.having.as_ref().map(|h| retag(h, anchors)),
            };
            ExprNode::new(e.id, e.span, ExprKind::Select(Box::new(select)))
        }
        _ => mcalc_ast::map_children(e, &mut |c| retag(c, anchors)),
    }
}

fn retag_qualifiers(qs: &[Qualifier], anchors: &FxHashMap<NodeId, Symbol>) -> Vec<Qualifier> {
    qs.iter()
        .map(|q| match q {
            Qualifier::Gen(None, src) => {
                let src2 = retag(src, anchors);
                match anchors.get(&src.id) {
                    Some(fresh) => Qualifier::Gen(Some(Pattern::Idn(fresh.clone(), src.span)), src2),
                    None => Qualifier::Gen(None, src2),
                }
            }
            Qualifier::Gen(Some(p), src) => Qualifier::Gen(Some(p.clone()), retag(src, anchors)),
            Qualifier::Bind(p, u) => Qualifier::Bind(p.clone(), retag(u, anchors)),
            Qualifier::Exp(pred) => Qualifier::Exp(retag(pred, anchors)),
        })
        .collect()
}
