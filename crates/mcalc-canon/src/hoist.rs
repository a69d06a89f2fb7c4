//! Nested-comprehension hoisting (§4.4 "Nested comprehension hoisting"):
//! folds a comprehension whose body is itself a same-monoid comprehension
//! into one flat qualifier list, and splices away a generator whose source
//! is itself a comprehension - the latter isn't spelled out as its own rule
//! in the source, but is forced by the canonical-form invariant that every
//! generator's source reduce to a bare [`crate::path::Path`] (see
//! `DESIGN.md`, "generator-source splicing").
//!
//! Both rewrites run to a fixed point bounded by
//! [`mcalc_common::limits::MAX_HOIST_ITERATIONS`]: a safety valve against
//! pathological input, not a semantic limit (§4.4 wording, mirrored in the
//! limit's own doc comment).

use mcalc_ast::{Expr, ExprKind, Qualifier};
use mcalc_common::limits::MAX_HOIST_ITERATIONS;
use mcalc_types::Monoid;

use crate::CanonCtx;

/// Two monoids "fuse" for hoisting purposes only when they are provably the
/// same monoid - literal equality for a concrete monoid, symbol-id equality
/// for a `Variable` (never consulting the monoid graph's bounds: a variable
/// that merely *could* resolve to the same monoid as its neighbor isn't
/// proof that it will, and folding on a guess would silently change the
/// result if the solver later picks differently).
#[must_use]
pub fn monoids_fuse(m1: &Monoid, m2: &Monoid) -> bool {
    match (m1, m2) {
        (Monoid::Variable(a), Monoid::Variable(b)) => a.id() == b.id(),
        (Monoid::Variable(_), _) | (_, Monoid::Variable(_)) => false,
        _ => m1 == m2,
    }
}

/// Run generator-source splicing and body fusion to a fixed point, starting
/// from `qs1`/`body` of an outer `Comp(m1, qs1, body)`.
pub fn hoist_fixed_point(m1: &Monoid, qs1: Vec<Qualifier>, body: Expr, ctx: &mut CanonCtx) -> (Vec<Qualifier>, Expr) {
    let mut qs = qs1;
    let mut body = body;
    for _ in 0..MAX_HOIST_ITERATIONS {
        let (spliced, gens_changed) = splice_generator_sources(&qs);
        qs = spliced;

        if let ExprKind::Comp(m2, qs2, body2) = &body.kind {
            if monoids_fuse(m1, m2) {
                qs.extend(qs2.iter().cloned());
                body = (**body2).clone();
                continue;
            }
        }

        if !gens_changed {
            break;
        }
    }
    let _ = ctx;
    (qs, body)
}

/// One left-to-right pass replacing every `Gen(pat, Comp(_, innerQs,
/// innerBody))` with `innerQs` followed by a `Bind(pat, innerBody)` - the
/// generator's monoid doesn't matter here, since a generator only ever
/// consumes its source's *elements*, not the discipline that produced them.
fn splice_generator_sources(qs: &[Qualifier]) -> (Vec<Qualifier>, bool) {
    let mut changed = false;
    let mut out = Vec::with_capacity(qs.len());
    for q in qs {
        match q {
            Qualifier::Gen(pat, src) => match &src.kind {
                ExprKind::Comp(_, inner_qs, inner_body) => {
                    changed = true;
                    out.extend(inner_qs.iter().cloned());
                    match pat {
                        Some(p) => out.push(Qualifier::Bind(p.clone(), (**inner_body).clone())),
                        None => out.push(Qualifier::Gen(None, (**inner_body).clone())),
                    }
                }
                _ => out.push(q.clone()),
            },
            other => out.push(other.clone()),
        }
    }
    (out, changed)
}
