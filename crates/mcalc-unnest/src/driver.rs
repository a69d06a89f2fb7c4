//! The term-rewriting driver `T(e, u, w, E)` (§4.5 "Driver"): rules
//! C4/C6/C7 consume generators building up `Select/Join/Unnest` in order;
//! C5/C8 are the base cases (`Reduce`/`Nest`); C11/C12 hoist a nested
//! comprehension out of predicate or yield position before the base case
//! can fire; C9/C10 are C6/C7's outer-variant counterparts, used while
//! folding a *correlated* hoisted comprehension's own generators onto the
//! accumulating outer pattern so an outer row survives even when nothing
//! inside the correlated comprehension matches it.
//!
//! Two shapes of nested comprehension reach C11/C12's hoist: the
//! self-joined `GROUP BY` aggregate (recognized directly off the canonical
//! tree by `try_group_nest`, since it is the one shape `mcalc-desugar`
//! itself produces and its recognizable structure lets `Nest` be built
//! without first walking C9/C10's generator-by-generator recursion) and
//! everything else, dispatched by `hoist_independent_subqueries` on whether
//! the comprehension is independent of the pattern bound so far or
//! correlated with it. A correlated one not in the group-by shape folds
//! its own generators onto
//! the outer `(w, e)` via `consume_generators(..., outer = true)` (C9/C10),
//! then closes with `Nest` keyed on the outer pattern (C8's general case,
//! not just the group-by shortcut) - see `hoist_correlated`.

use rustc_hash::FxHashMap;

use mcalc_ast::{BinaryOp, Expr, ExprKind, NodeId};
use mcalc_common::{limits::MAX_HOIST_ITERATIONS, CalculusError, Span, Symbol};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};

use mcalc_canon::Generator;

use crate::algebra::{AlgExpr, AlgebraNode};
use crate::pattern::{reduce_pattern, Pattern};
use crate::split;
use crate::translate::translate_expr;
use crate::UnnestCtx;

pub fn unnest(root: &Expr, ctx: &mut UnnestCtx) -> Result<AlgebraNode, CalculusError> {
    let (monoid, gens, pred, body) = mcalc_canon::decompose_canonical_comp(root, &ctx.canon)?;
    let pool = mcalc_canon::collect_conjuncts(&pred);

    if let Some(nest) = try_group_nest(&monoid, &gens, &pool, &body, root.span, ctx)? {
        return Ok(nest);
    }

    let (w, e, pool) = consume_generators(Pattern::Empty, AlgebraNode::Empty, &gens, pool, false, ctx)?;
    let (w, e, body, pool) = hoist_independent_subqueries(w, e, body, pool, ctx)?;

    let leftover = conjoin(pool, root.span, ctx)?;
    let pred_alg = translate_expr(&leftover, &w, ctx)?;
    let body_alg = translate_expr(&body, &w, ctx)?;
    Ok(AlgebraNode::Reduce {
        monoid,
        e: body_alg,
        pred: pred_alg,
        child: Box::new(e),
        span: root.span,
    })
}

/// Drives rules C4/C6/C7 (or, when `outer` is set, their C9/C10
/// outer-variant counterparts) over `gens` in order, starting from `w0`/`e0`
/// rather than always `Empty` - the top-level call seeds both `Empty`; a
/// correlated hoist (`hoist_correlated`) seeds the outer pattern/algebra
/// already built so far, so its own generators extend the *same* running
/// join/unnest chain instead of starting a disconnected one. `w0` grows by
/// one variable per generator; `e0` accumulates `Scan`/`Join`/`Unnest` (or
/// `OuterJoin`/`OuterUnnest` when `outer`) nodes. Returns the final
/// pattern, algebra, and whatever predicate conjuncts couldn't be attached
/// to any single generator (touch no bound variable yet, or still contain a
/// nested comprehension - §4.5 "Predicate split" class `p3`).
fn consume_generators(
    w0: Pattern,
    e0: AlgebraNode,
    gens: &[Generator],
    mut pool: Vec<Expr>,
    outer: bool,
    ctx: &UnnestCtx,
) -> Result<(Pattern, AlgebraNode, Vec<Expr>), CalculusError> {
    let mut w = w0;
    let mut e = e0;
    for gen in gens {
        let (p1, p2, rest) = split::split(pool, &w, std::slice::from_ref(&gen.var));
        pool = rest;
        let var_pattern = Pattern::Variable(gen.var.clone(), gen.var_ty.clone());
        let root_bound = w.binds(gen.path.root());

        if !root_bound {
            // C4 (no prior child) / C6 (with prior child): a brand-new
            // relation scan over `gen.path`'s catalog source.
            let source = gen.path.root().name().to_string();
            let scan = AlgebraNode::Scan { source, elem_ty: gen.var_ty.clone(), span: gen.span };
            let p1_expr = conjoin(p1, gen.span, ctx)?;
            let p1_alg = translate_expr(&p1_expr, &var_pattern, ctx)?;
            let new_rel = select_or_child(p1_alg, scan, gen.span);
            e = match e {
                AlgebraNode::Empty => new_rel,
                prior => {
                    let joined_pattern = Pattern::pair(w.clone(), var_pattern.clone());
                    let p2_expr = conjoin(p2, gen.span, ctx)?;
                    let p2_alg = translate_expr(&p2_expr, &joined_pattern, ctx)?;
                    if outer {
                        // C9: preserve a prior (possibly outer-correlated)
                        // row even when this generator has no match.
                        AlgebraNode::OuterJoin {
                            pred: p2_alg,
                            left: Box::new(prior),
                            right: Box::new(new_rel),
                            span: gen.span,
                        }
                    } else {
                        AlgebraNode::Join {
                            pred: p2_alg,
                            left: Box::new(prior),
                            right: Box::new(new_rel),
                            span: gen.span,
                        }
                    }
                }
            };
        } else {
            // C7 (or its outer variant C10): an inner-path generator
            // unnests a field of an already-bound row; both predicate
            // classes attach directly to the `Unnest`/`OuterUnnest` node
            // (§4.5: "Unnest(pathToAlgebra(x), p1 ∧ p2, E)").
            let joined_pattern = Pattern::pair(w.clone(), var_pattern.clone());
            let path_alg = path_to_alg_expr(&gen.path, &w, ctx)?;
            let mut combined = p1;
            combined.extend(p2);
            let pred_expr = conjoin(combined, gen.span, ctx)?;
            let pred_alg = translate_expr(&pred_expr, &joined_pattern, ctx)?;
            e = if outer {
                AlgebraNode::OuterUnnest { path: path_alg, pred: pred_alg, child: Box::new(e), span: gen.span }
            } else {
                AlgebraNode::Unnest { path: path_alg, pred: pred_alg, child: Box::new(e), span: gen.span }
            };
        }
        w = Pattern::pair(w, var_pattern);
    }
    Ok((w, e, pool))
}

fn select_or_child(pred: AlgExpr, child: AlgebraNode, span: Span) -> AlgebraNode {
    if pred.is_trivially_true() {
        child
    } else {
        AlgebraNode::Select { pred, child: Box::new(child), span }
    }
}

/// AND together `exprs` (the `true` constant if empty) using the
/// canonicalizer's own builder, so the result can be handed to
/// [`translate_expr`] as a single expression.
fn conjoin(mut exprs: Vec<Expr>, span: Span, ctx: &UnnestCtx) -> Result<Expr, CalculusError> {
    let Some(mut acc) = exprs.pop() else {
        return Ok(ctx.canon.builder.bool_const(true, span));
    };
    for e in exprs {
        acc = ctx.canon.builder.binary(BinaryOp::And, acc, e, span);
    }
    Ok(acc)
}

/// `pathToAlgebra` (§4.5 "Expression and path translation"): resolves a
/// generator path's root against the current pattern and folds its field
/// chain into nested `RecordProj`s, looking up each intermediate field's
/// type from the prior step's record type.
fn path_to_alg_expr(path: &mcalc_canon::Path, pattern: &Pattern, ctx: &UnnestCtx) -> Result<AlgExpr, CalculusError> {
    let root = path.root();
    let idx = pattern.index_of(root).ok_or_else(|| CalculusError::InternalError {
        message: format!("unnester: path root `{root}` is not bound by the current pattern"),
        pos: Span::synthetic(),
    })?;
    let root_ty = pattern
        .pattern_variables()
        .into_iter()
        .find(|(s, _)| s.id() == root.id())
        .map_or(mcalc_types::Type::AnyType, |(_, t)| t);

    let mut cur = AlgExpr::Argument(root_ty.clone(), idx);
    let mut cur_ty = root_ty;
    for field in path.fields() {
        cur_ty = field_type(&cur_ty, &field);
        cur = AlgExpr::RecordProj(Box::new(cur), field);
    }
    Ok(cur)
}

fn field_type(ty: &mcalc_types::Type, field: &Symbol) -> mcalc_types::Type {
    if let mcalc_types::Type::Record(atts) = ty {
        if let Some(a) = atts.find_attribute(field.name()) {
            return a.ty.clone();
        }
    }
    mcalc_types::Type::AnyType
}

/// Recognizes the shape `mcalc-desugar`'s `GROUP BY` lowering produces for
/// a single aggregate field (see `select.rs`'s `desugar_group_by`): a
/// two-field yield record where one field is the group key and the other
/// is a nested, primitive-monoid comprehension that re-scans the same
/// sources as the outer `FROM` with an equality conjunct pinning it to the
/// outer row's key. When it matches, builds the `Nest` directly (§4.5 rule
/// C8, with `g`/`key` read off the recognized correlation) from the
/// outer comprehension's own generator list, rather than going through
/// `hoist_correlated`'s generic route of folding a *hoisted* comprehension's
/// generators one at a time via C9/C10 - this shape's correlation is
/// already known structurally, so there is nothing to fold.
///
/// Returns `Ok(None)` whenever the shape doesn't match, or matches but the
/// outer generators still have an unresolved predicate left over (a
/// `HAVING` clause, most commonly) - that combination isn't supported by
/// this shortcut (see `DESIGN.md`, "HAVING is not supported"); a plain
/// correlated nested comprehension appearing in predicate or yield
/// position (not this shape) still hoists via `hoist_correlated`.
#[allow(clippy::too_many_arguments)]
fn try_group_nest(
    outer_monoid: &Monoid,
    gens: &[Generator],
    outer_pool: &[Expr],
    body: &Expr,
    span: Span,
    ctx: &UnnestCtx,
) -> Result<Option<AlgebraNode>, CalculusError> {
    let ExprKind::RecordCons(fields) = &body.kind else {
        return Ok(None);
    };
    if fields.len() != 2 {
        return Ok(None);
    }
    let outer_vars: Vec<Symbol> = gens.iter().map(|g| g.var.clone()).collect();

    for (key_idx, agg_idx) in [(0usize, 1usize), (1, 0)] {
        let key_field = &fields[key_idx];
        let agg_field = &fields[agg_idx];
        if !matches!(agg_field.value.kind, ExprKind::Comp(..)) {
            continue;
        }
        if !all_free_vars_in(&key_field.value, &outer_vars) {
            continue;
        }

        let (agg_monoid, nested_gens, nested_pred, nested_yield) =
            mcalc_canon::decompose_canonical_comp(&agg_field.value, &ctx.canon)?;
        if agg_monoid.is_collection() {
            continue;
        }
        let nested_vars: Vec<Symbol> = nested_gens.iter().map(|g| g.var.clone()).collect();
        let mut conjuncts = mcalc_canon::collect_conjuncts(&nested_pred);
        let Some(corr_idx) = find_correlation(&conjuncts, &outer_vars, &nested_vars) else {
            continue;
        };
        conjuncts.remove(corr_idx);

        let (w_outer, child, outer_leftover) =
            consume_generators(Pattern::Empty, AlgebraNode::Empty, gens, outer_pool.to_vec(), false, ctx)?;
        if !outer_leftover.is_empty() {
            continue;
        }

        let key_alg = translate_expr(&key_field.value, &w_outer, ctx)?;

        let mut g_pattern = Pattern::Empty;
        for ng in &nested_gens {
            g_pattern = Pattern::pair(g_pattern, Pattern::Variable(ng.var.clone(), ng.var_ty.clone()));
        }
        let g_pattern = reduce_pattern(&g_pattern, &w_outer);

        let nested_pred_expr = conjoin(conjuncts, span, ctx)?;
        let nested_pred_alg = translate_expr(&nested_pred_expr, &g_pattern, ctx)?;
        let e_alg = translate_expr(&nested_yield, &g_pattern, ctx)?;

        return Ok(Some(AlgebraNode::Nest {
            monoid: agg_monoid,
            e: e_alg,
            key: key_alg,
            pred: nested_pred_alg,
            g: g_pattern,
            child: Box::new(child),
            outer_monoid: outer_monoid.clone(),
            key_field: key_field.idn.clone(),
            agg_field: agg_field.idn.clone(),
            span,
        }));
    }
    Ok(None)
}

fn all_free_vars_in(e: &Expr, allowed: &[Symbol]) -> bool {
    mcalc_ast::free_idns(e).iter().all(|s| allowed.iter().any(|a| a.id() == s.id()))
}

/// Finds a conjunct of shape `a = b` where one side's free variables are
/// entirely among `outer_vars` and the other's are entirely among
/// `nested_vars` - the correlation an alpha-renamed `GROUP BY` self-join
/// always has exactly one of (`select.rs`'s `eq`, built from
/// `clone_group_by = outer_group_by`).
fn find_correlation(conjuncts: &[Expr], outer_vars: &[Symbol], nested_vars: &[Symbol]) -> Option<usize> {
    conjuncts.iter().position(|c| {
        let ExprKind::BinaryExp(BinaryOp::Eq, a, b) = &c.kind else {
            return false;
        };
        let side_is = |e: &Expr, vars: &[Symbol]| {
            let free = mcalc_ast::free_idns(e);
            !free.is_empty() && free.iter().all(|s| vars.iter().any(|v| v.id() == s.id()))
        };
        (side_is(a, outer_vars) && side_is(b, nested_vars)) || (side_is(b, outer_vars) && side_is(a, nested_vars))
    })
}

/// Hoists every nested comprehension remaining in `body` and in `pool`'s
/// conjuncts to a fixed point (§4.5 rules C9/C10/C11/C12). `body` and
/// `pool` are walked as one combined list of items so that a hoist
/// discovered while scanning one item - which can change `w`/`e` and so
/// invalidate every other item's free-variable bookkeeping (a correlated
/// hoist retargets `w` to a fresh row variable, §4.5 rule C8) - gets its
/// substitutions applied to every item still waiting to be processed, not
/// just the one it was found in.
///
/// An independent comprehension (no free variable bound by `w`) hoists via
/// a plain `OuterJoin` appending one new flat pattern variable (C11/C12).
/// A correlated one folds through `hoist_correlated` instead (C9/C10 plus
/// C8's general case).
fn hoist_independent_subqueries(
    w: Pattern,
    e: AlgebraNode,
    body: Expr,
    pool: Vec<Expr>,
    ctx: &mut UnnestCtx,
) -> Result<(Pattern, AlgebraNode, Expr, Vec<Expr>), CalculusError> {
    let mut items: Vec<Expr> = Vec::with_capacity(pool.len() + 1);
    items.push(body);
    items.extend(pool);

    let mut w = w;
    let mut e = e;
    let mut iterations = 0usize;
    loop {
        let Some((_item_idx, target_id, ep, ep_span)) = find_first_nested_comp(&items) else {
            break;
        };
        iterations += 1;
        if iterations > MAX_HOIST_ITERATIONS {
            return Err(CalculusError::InternalError {
                message: "unnester: exceeded the hoisting iteration limit".into(),
                pos: ep_span,
            });
        }

        let bound: Vec<Symbol> = w.pattern_variables().into_iter().map(|(s, _)| s).collect();
        let free = mcalc_ast::free_idns(&ep);
        let correlated = free.iter().any(|s| bound.iter().any(|b| b.id() == s.id()));

        if correlated {
            let (nest, row_pattern, v, subs) = hoist_correlated(&ep, &w, e, ep_span, ctx)?;
            let v_idn = ctx.canon.builder.idn(v.clone(), ep_span);
            ctx.canon.record_type(v_idn.id, ctx.type_of(&ep));

            let mut target_replacement: FxHashMap<NodeId, Expr> = FxHashMap::default();
            target_replacement.insert(target_id, v_idn);
            for item in &mut items {
                *item = mcalc_ast::replace_by_id(item, &target_replacement);
            }
            for (sym, replacement) in &subs {
                for item in &mut items {
                    *item = mcalc_ast::substitute_idn(item, sym, replacement);
                }
            }

            e = nest;
            w = row_pattern;
        } else {
            let ep_alg = unnest(&ep, ctx)?;
            let v = ctx.fresh_symbol("v");
            let v_ty = ctx.type_of(&ep);
            let v_idn = ctx.canon.builder.idn(v.clone(), ep_span);
            ctx.canon.record_type(v_idn.id, v_ty.clone());

            let mut replacements: FxHashMap<NodeId, Expr> = FxHashMap::default();
            replacements.insert(target_id, v_idn);
            for item in &mut items {
                *item = mcalc_ast::replace_by_id(item, &replacements);
            }

            e = AlgebraNode::OuterJoin {
                pred: AlgExpr::bool_true(),
                left: Box::new(e),
                right: Box::new(ep_alg),
                span: ep_span,
            };
            w = Pattern::pair(w, Pattern::Variable(v, v_ty));
        }
    }

    let body = items.remove(0);
    Ok((w, e, body, items))
}

/// §4.5 rules C9/C10 + C8: folds a correlated nested comprehension `ep`'s
/// own generators onto the outer pattern `w`/algebra `e` using the outer
/// variants of join/unnest (so an outer row survives even when nothing in
/// `ep` matches it), then closes the exhausted qualifier list with `Nest`
/// keyed on `w`'s own value(s) - one output row per original outer row,
/// carrying the outer key alongside `ep`'s reduced value.
///
/// `Nest`'s output is a two-field record (`key_field`/`agg_field`); the
/// algebra has no separate "reshape" node to flatten it back into the
/// pre-hoist positional row, so rather than extend the driver's
/// `Pattern`/`Argument` addressing to understand this indirection, every
/// remaining reference to `w`'s own variables and to `ep`'s substituted
/// value is rewritten at the calculus level - `RecordProj`s off one fresh
/// row identifier - before the rest of the comprehension is translated.
/// This reuses the same mechanism (`mcalc_ast::substitute_idn`) that
/// `mcalc-canon`'s beta-reduction already uses to destructure a tuple
/// pattern positionally against a record argument.
///
/// Returns the `Nest`, the single-variable `Pattern` addressing its output
/// row, `ep`'s own substituted variable `v`, and the list of
/// `(symbol, replacement)` substitutions the caller must apply to every
/// expression still referencing the pre-hoist pattern (`v` itself, plus
/// each of `w`'s variables).
fn hoist_correlated(
    ep: &Expr,
    w: &Pattern,
    e: AlgebraNode,
    ep_span: Span,
    ctx: &mut UnnestCtx,
) -> Result<(AlgebraNode, Pattern, Symbol, Vec<(Symbol, Expr)>), CalculusError> {
    let (monoid, gens, pred, body) = mcalc_canon::decompose_canonical_comp(ep, &ctx.canon)?;
    let pool = mcalc_canon::collect_conjuncts(&pred);

    let outer_vars = w.pattern_variables();
    let (key_alg, key_ty, key_fields) = outer_key_expr(w, &outer_vars, ctx);

    let (w_full, e_full, leftover) = consume_generators(w.clone(), e, &gens, pool, true, ctx)?;
    let g_pattern = reduce_pattern(&w_full, w);

    let leftover_expr = conjoin(leftover, ep_span, ctx)?;
    let pred_alg = translate_expr(&leftover_expr, &w_full, ctx)?;
    let body_alg = translate_expr(&body, &w_full, ctx)?;

    let v = ctx.fresh_symbol("v");
    let v_ty = ctx.type_of(ep);
    let key_field = ctx.fresh_symbol("_key");
    let agg_field = ctx.fresh_symbol("_value");
    let row_ty = Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(key_field.clone(), key_ty.clone()),
        Attribute::new(agg_field.clone(), v_ty.clone()),
    ]));

    let nest = AlgebraNode::Nest {
        monoid,
        e: body_alg,
        key: key_alg,
        pred: pred_alg,
        g: g_pattern,
        child: Box::new(e_full),
        outer_monoid: Monoid::Bag,
        key_field: key_field.clone(),
        agg_field: agg_field.clone(),
        span: ep_span,
    };

    let row_sym = ctx.fresh_symbol("row");
    let row_idn = ctx.canon.builder.idn(row_sym.clone(), ep_span);
    ctx.canon.record_type(row_idn.id, row_ty.clone());

    let mut subs: Vec<(Symbol, Expr)> = Vec::with_capacity(outer_vars.len() + 1);
    let v_proj = ctx.canon.builder.record_proj(row_idn.clone(), agg_field, ep_span);
    ctx.canon.record_type(v_proj.id, v_ty);
    subs.push((v.clone(), v_proj));

    let key_proj = ctx.canon.builder.record_proj(row_idn, key_field, ep_span);
    ctx.canon.record_type(key_proj.id, key_ty);
    match key_fields {
        Some(fields) => {
            for (sym, field_sym, ty) in fields {
                let proj = ctx.canon.builder.record_proj(key_proj.clone(), field_sym, ep_span);
                ctx.canon.record_type(proj.id, ty);
                subs.push((sym, proj));
            }
        }
        None => {
            if let Some((sym, _)) = outer_vars.into_iter().next() {
                subs.push((sym, key_proj));
            }
        }
    }

    let row_pattern = Pattern::Variable(row_sym, row_ty);
    Ok((nest, row_pattern, v, subs))
}

/// Builds the `key` expression a correlated hoist's `Nest` groups by, from
/// `w`'s own variables (evaluated against `w` itself - unaffected by the
/// generators `hoist_correlated` is about to fold on, since those only
/// append further pattern variables after `w`'s existing ones). A single
/// outer variable is used directly as the key's value; more than one is
/// packed into a synthetic record, whose field mapping is returned so
/// `hoist_correlated` can route each variable's later references through
/// the matching field.
fn outer_key_expr(
    w: &Pattern,
    vars: &[(Symbol, Type)],
    ctx: &UnnestCtx,
) -> (AlgExpr, Type, Option<Vec<(Symbol, Symbol, Type)>>) {
    if let [(sym, ty)] = vars {
        let idx = w.index_of(sym).expect("pattern_variables() symbol must resolve via index_of");
        return (AlgExpr::Argument(ty.clone(), idx), ty.clone(), None);
    }

    let mut field_exprs = Vec::with_capacity(vars.len());
    let mut atts = Vec::with_capacity(vars.len());
    let mut mapping = Vec::with_capacity(vars.len());
    for (i, (sym, ty)) in vars.iter().enumerate() {
        let idx = w.index_of(sym).expect("pattern_variables() symbol must resolve via index_of");
        let field_sym = ctx.fresh_symbol(&format!("_{}", i + 1));
        field_exprs.push((field_sym.clone(), AlgExpr::Argument(ty.clone(), idx)));
        atts.push(Attribute::new(field_sym.clone(), ty.clone()));
        mapping.push((sym.clone(), field_sym, ty.clone()));
    }
    let key_ty = Type::record(RecordAttributes::Attributes(atts));
    (AlgExpr::RecordCons(field_exprs), key_ty, Some(mapping))
}

fn find_first_nested_comp(items: &[Expr]) -> Option<(usize, NodeId, Expr, Span)> {
    for (idx, item) in items.iter().enumerate() {
        let mut found: Option<(NodeId, Expr, Span)> = None;
        mcalc_ast::walk(item, &mut |n| {
            if found.is_none() && matches!(n.kind, ExprKind::Comp(..)) {
                found = Some((n.id, n.clone(), n.span));
            }
        });
        if let Some((id, ep, span)) = found {
            return Some((idx, id, ep, span));
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/driver.rs"]
mod tests;
