//! The nullability post-pass (§4.2 "Nullability pass"): after base typing
//! succeeds, propagate a `nullable` flag bottom-up. A node's type is
//! nullable if its model types (its semantic operands) or its
//! null-carrying operands are nullable.
//!
//! `OuterJoin`/`OuterUnnest` forcing their right side nullable (§4.2) is an
//! algebra-level rule realized in `mcalc-unnest`'s nullability propagation,
//! since those constructs exist only in the post-unnest target algebra in
//! this implementation (§0 crate layout: algebra IR lives in
//! `mcalc-unnest`, not the calculus AST) — see `DESIGN.md`.

use mcalc_ast::{Expr, ExprKind, NodeId};
use mcalc_types::Type;
use rustc_hash::FxHashMap;

pub fn compute_nullability(
    root: &Expr,
    types: &FxHashMap<NodeId, Type>,
    entities: &FxHashMap<NodeId, mcalc_ast::Entity>,
) -> FxHashMap<NodeId, bool> {
    let mut out = FxHashMap::default();
    walk(root, types, entities, &mut out);
    out
}

fn walk(
    e: &Expr,
    types: &FxHashMap<NodeId, Type>,
    entities: &FxHashMap<NodeId, mcalc_ast::Entity>,
    out: &mut FxHashMap<NodeId, bool>,
) -> bool {
    if let Some(existing) = out.get(&e.id) {
        return *existing;
    }
    let nullable = match &e.kind {
        ExprKind::BoolConst(_) | ExprKind::IntConst(_) | ExprKind::FloatConst(_) | ExprKind::StringConst(_) => false,

        ExprKind::IdnExp(_) => false,

        ExprKind::RecordProj(inner, _) => walk(inner, types, entities, out),
        ExprKind::RecordCons(fields) => fields.iter().any(|f| walk(&f.value, types, entities, out)),
        ExprKind::IfThenElse(c, t, f) => {
            walk(c, types, entities, out) | walk(t, types, entities, out) | walk(f, types, entities, out)
        }
        ExprKind::BinaryExp(_, l, r) => walk(l, types, entities, out) | walk(r, types, entities, out),
        ExprKind::UnaryExp(_, inner) => walk(inner, types, entities, out),
        ExprKind::MergeMonoid(_, l, r) => walk(l, types, entities, out) | walk(r, types, entities, out),
        ExprKind::ZeroCollectionMonoid(_) => false,
        ExprKind::ConsCollectionMonoid(_, inner) => walk(inner, types, entities, out),
        ExprKind::MultiCons(_, items) => items.iter().any(|i| walk(i, types, entities, out)),
        ExprKind::Comp(_, qs, body) => {
            let mut any = false;
            for q in qs {
                any |= match q {
                    mcalc_ast::Qualifier::Gen(_, src) => walk(src, types, entities, out),
                    mcalc_ast::Qualifier::Bind(_, u) => walk(u, types, entities, out),
                    mcalc_ast::Qualifier::Exp(pred) => walk(pred, types, entities, out),
                };
            }
            any | walk(body, types, entities, out)
        }
        ExprKind::Select(s) => {
            let mut any = false;
            for q in &s.from {
                if let mcalc_ast::Qualifier::Gen(_, src) = q {
                    any |= walk(src, types, entities, out);
                }
            }
            if let Some(w) = &s.where_ {
                any |= walk(w, types, entities, out);
            }
            if let Some(g) = &s.group_by {
                any |= walk(g, types, entities, out);
            }
            if let Some(h) = &s.having {
                any |= walk(h, types, entities, out);
            }
            any | walk(&s.proj, types, entities, out)
        }
        ExprKind::FunAbs(_, body) => walk(body, types, entities, out),
        ExprKind::FunApp(f, a) => walk(f, types, entities, out) | walk(a, types, entities, out),
        ExprKind::ExpBlock(binds, body) => {
            let mut any = false;
            for (_, u) in binds {
                any |= walk(u, types, entities, out);
            }
            any | walk(body, types, entities, out)
        }
        ExprKind::Partition | ExprKind::Star => false,
        ExprKind::Into(e1, e2) => walk(e1, types, entities, out) | walk(e2, types, entities, out),
        ExprKind::Sum(inner)
        | ExprKind::Max(inner)
        | ExprKind::Min(inner)
        | ExprKind::Avg(inner)
        | ExprKind::Count(inner)
        | ExprKind::Exists(inner) => walk(inner, types, entities, out),
        ExprKind::InExp(e1, e2) => walk(e1, types, entities, out) | walk(e2, types, entities, out),
    };
    let _ = types.get(&e.id);
    let _ = entities.get(&e.id);
    out.insert(e.id, nullable);
    nullable
}
