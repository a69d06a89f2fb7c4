//! The Normalizer/Canonicalizer (§4.4): the third pipeline stage (§2 item
//! 5), turning a desugared tree of plain comprehensions into the canonical
//! form the unnester requires - every `Comp` reduced to a flat generator
//! list, each generator's source a bare [`Path`], plus exactly one
//! CNF-form trailing predicate and a (possibly still nested) yield body.
//!
//! Runs bottom-up in one pass: beta-reducing `FunApp`/`FunAbs` redexes as
//! they're found, then for each `Comp` node - hoisting nested
//! same-monoid comprehensions and generator-source comprehensions
//! ([`hoist`]), inlining the `Bind` qualifiers that remain, and finally
//! folding every leftover boolean qualifier into one CNF predicate
//! ([`cnf`]). `Select` never reaches this crate: the desugarer (§4.3)
//! eliminates it before this stage runs.

use std::rc::Rc;

use mcalc_ast::{Builder, Expr, ExprKind, NodeId, NodeIdGenerator, Pattern, Qualifier};
use mcalc_common::{CalculusError, Span, Symbol, SymbolGenerator};
use mcalc_types::{Monoid, RecordAttributes, Type};
use rustc_hash::FxHashMap;

mod beta;
mod cnf;
mod hoist;
pub mod path;

pub use cnf::{collect_conjuncts, collect_disjuncts};
pub use path::{expr_to_path, Path};

/// Threaded through every canon rule, mirroring `mcalc-desugar`'s
/// `DesugarCtx`: the fresh-node builder plus the node-keyed type table,
/// seeded from the desugarer's output and extended with an entry for every
/// node this crate synthesizes.
pub struct CanonCtx {
    pub builder: Builder,
    pub symbols: Rc<SymbolGenerator>,
    pub types: FxHashMap<NodeId, Type>,
}

impl CanonCtx {
    #[must_use]
    pub fn type_of(&self, e: &Expr) -> Type {
        self.types.get(&e.id).cloned().unwrap_or(Type::AnyType)
    }

    pub fn record_type(&mut self, id: NodeId, ty: Type) {
        self.types.insert(id, ty);
    }
}

pub struct CanonResult {
    pub expr: Expr,
    pub types: FxHashMap<NodeId, Type>,
}

/// Top-level entry point (§2 item 5).
pub fn canonicalize(
    root: &Expr,
    types: FxHashMap<NodeId, Type>,
    ids: Rc<NodeIdGenerator>,
    symbols: Rc<SymbolGenerator>,
) -> CanonResult {
    let mut ctx = CanonCtx {
        builder: Builder::new(ids, symbols.clone()),
        symbols,
        types,
    };
    tracing::debug!("canon: beta-normalizing and reducing comprehensions to canonical form");
    let expr = canonicalize_expr(root, &mut ctx);
    CanonResult { expr, types: ctx.types }
}

/// The single bottom-up rewrite: every `Comp` gets the full canonicalization
/// treatment once its own qualifiers and body are already canonical (by
/// induction); every other node just has its children canonicalized and any
/// resulting beta-redex reduced.
fn canonicalize_expr(e: &Expr, ctx: &mut CanonCtx) -> Expr {
    match &e.kind {
        ExprKind::Comp(m, qs, body) => {
            let qs: Vec<Qualifier> = qs.iter().map(|q| canonicalize_qualifier(q, ctx)).collect();
            let body = canonicalize_expr(body, ctx);
            let out = canonicalize_comp(m.clone(), qs, body, e.span, ctx);
            ctx.record_type(out.id, ctx.type_of(e));
            out
        }
        _ => {
            let rewritten = mcalc_ast::map_children(e, &mut |c| canonicalize_expr(c, ctx));
            beta::beta_reduce(&rewritten, ctx)
        }
    }
}

fn canonicalize_qualifier(q: &Qualifier, ctx: &mut CanonCtx) -> Qualifier {
    match q {
        Qualifier::Gen(p, src) => Qualifier::Gen(p.clone(), canonicalize_expr(src, ctx)),
        Qualifier::Bind(p, u) => Qualifier::Bind(p.clone(), canonicalize_expr(u, ctx)),
        Qualifier::Exp(pred) => Qualifier::Exp(canonicalize_expr(pred, ctx)),
    }
}

/// Reduce one `Comp(m, qs, body)`, with `qs`/`body` already canonical in
/// their own subexpressions, to the canonical generator-list-plus-predicate
/// shape (§4.4).
fn canonicalize_comp(m: Monoid, qs: Vec<Qualifier>, body: Expr, span: Span, ctx: &mut CanonCtx) -> Expr {
    let (qs, body) = hoist::hoist_fixed_point(&m, qs, body, ctx);
    let (qs, body) = inline_binds(qs, body, ctx);

    let mut gens = Vec::new();
    let mut preds = Vec::new();
    for q in qs {
        match q {
            Qualifier::Gen(..) => gens.push(q),
            Qualifier::Exp(pred) => preds.push(pred),
            Qualifier::Bind(..) => unreachable!("bind qualifiers are fully inlined by inline_binds"),
        }
    }

    let pred = cnf::conjoin_cnf(&preds, span, ctx);
    gens.push(Qualifier::Exp(pred));

    ctx.builder.comp(m, gens, body, span)
}

/// Inline every remaining `Bind(pat, u)` qualifier by substituting `u` (via
/// `pat`'s destructuring) throughout the rest of the qualifier list and the
/// body, in order, so a later bind can still see an earlier one's
/// substitution (§4.4 "bind inlining").
fn inline_binds(qs: Vec<Qualifier>, body: Expr, ctx: &mut CanonCtx) -> (Vec<Qualifier>, Expr) {
    let mut out = Vec::with_capacity(qs.len());
    let mut rest: std::collections::VecDeque<Qualifier> = qs.into();
    let mut body = body;
    while let Some(q) = rest.pop_front() {
        if let Qualifier::Bind(pat, u) = &q {
            rest = rest
                .into_iter()
                .map(|q2| substitute_in_qualifier(&q2, pat, u, ctx))
                .collect();
            body = beta::substitute_pattern(pat, u, &body, ctx);
        } else {
            out.push(q);
        }
    }
    (out, body)
}

fn substitute_in_qualifier(q: &Qualifier, pat: &Pattern, u: &Expr, ctx: &mut CanonCtx) -> Qualifier {
    match q {
        Qualifier::Gen(p, src) => Qualifier::Gen(p.clone(), beta::substitute_pattern(pat, u, src, ctx)),
        Qualifier::Bind(p, v) => Qualifier::Bind(p.clone(), beta::substitute_pattern(pat, u, v, ctx)),
        Qualifier::Exp(pred) => Qualifier::Exp(beta::substitute_pattern(pat, u, pred, ctx)),
    }
}

/// `record_field_names_or_positional`, duplicated from `mcalc-desugar`
/// (different `Ctx` type, same shape): the `k` field names of a resolved
/// record type, or synthetic `_1.._n` symbols for an unresolved/pattern
/// type.
pub(crate) fn record_fields_for(ty: &Type, arity: usize, ctx: &CanonCtx) -> Vec<(Symbol, Type)> {
    if let Type::Record(atts) = ty {
        if let RecordAttributes::Attributes(fields) = atts.as_ref() {
            return fields.iter().map(|a| (a.idn.clone(), a.ty.clone())).collect();
        }
    }
    (1..=arity)
        .map(|k| (ctx.symbols.declare(format!("_{k}")), Type::AnyType))
        .collect()
}

/// One generator of a canonical comprehension, resolved to a [`Path`] for
/// `mcalc-unnest`'s term-rewriting driver to traverse (§4.5).
#[derive(Clone, Debug)]
pub struct Generator {
    pub var: Symbol,
    pub var_ty: Type,
    pub path: Path,
    pub span: Span,
}

/// Tear a canonical `Comp` back apart into its monoid, generators, trailing
/// predicate, and body, for `mcalc-unnest` to drive its rewrite rules over.
/// Fails with [`CalculusError::InternalError`] if `e` doesn't have the
/// canonical shape this crate's output always has - a bug upstream, not a
/// user error (§4.5 "Failure semantics").
pub fn decompose_canonical_comp(
    e: &Expr,
    ctx: &CanonCtx,
) -> Result<(Monoid, Vec<Generator>, Expr, Expr), CalculusError> {
    let ExprKind::Comp(m, qs, body) = &e.kind else {
        return Err(CalculusError::InternalError {
            message: "expected a canonical comprehension node".into(),
            pos: e.span,
        });
    };

    let mut gens = Vec::new();
    let mut pred = None;
    for (i, q) in qs.iter().enumerate() {
        match q {
            Qualifier::Gen(Some(Pattern::Idn(sym, gspan)), src) => {
                let path = path::expr_to_path(src)?;
                let var_ty = ctx.type_of(src);
                gens.push(Generator {
                    var: sym.clone(),
                    var_ty,
                    path,
                    span: *gspan,
                });
            }
            Qualifier::Exp(p) if i == qs.len() - 1 => pred = Some(p.clone()),
            _ => {
                return Err(CalculusError::InternalError {
                    message: "malformed canonical comprehension: expected generators followed by exactly one trailing predicate".into(),
                    pos: q.span(),
                });
            }
        }
    }

    let pred = pred.ok_or_else(|| CalculusError::InternalError {
        message: "canonical comprehension is missing its trailing predicate".into(),
        pos: e.span,
    })?;

    Ok((m.clone(), gens, pred, body.clone()))
}

#[cfg(test)]
#[path = "tests/canon.rs"]
mod tests;
