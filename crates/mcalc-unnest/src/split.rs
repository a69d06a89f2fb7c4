//! Predicate splitting (§4.5 "Predicate split"): for a comprehension
//! `Comp(m, Gen(v, x) :: rest, pred, e)`, partitions the CNF conjuncts of
//! `pred` into `p1` (over only the new generator's variables, no nested
//! comprehension), `p2` (touches both the new generator and the
//! already-bound pattern, no nested comprehension), and `p3` (the
//! remainder, deferred to the recursive call).

use mcalc_ast::{free_idns, Expr};
use mcalc_common::Symbol;

use crate::pattern::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Over only the new generator's own variable(s).
    NewOnly,
    /// Touches both the already-bound pattern and the new generator.
    Both,
    /// Contains a nested comprehension, or references variables not yet
    /// bound anywhere in scope - deferred.
    Remainder,
}

/// Does `e` contain a nested comprehension anywhere within it (§4.5
/// "constructs that must have been eliminated" - the driver must hoist
/// these via C11/C12 before a conjunct can be classified as `NewOnly`/
/// `Both`)?
#[must_use]
pub fn contains_nested_comp(e: &Expr) -> bool {
    let mut found = false;
    mcalc_ast::walk(e, &mut |n| {
        if matches!(n.kind, mcalc_ast::ExprKind::Comp(..)) {
            found = true;
        }
    });
    found
}

/// Classify one conjunct relative to the already-bound pattern `w` and the
/// generator variable(s) just introduced, `new_vars`.
#[must_use]
pub fn classify(e: &Expr, w: &Pattern, new_vars: &[Symbol]) -> Class {
    if contains_nested_comp(e) {
        return Class::Remainder;
    }
    let free = free_idns(e);
    let bound_so_far: Vec<Symbol> = w.pattern_variables().into_iter().map(|(s, _)| s).collect();
    let all_known: Vec<&Symbol> = bound_so_far.iter().chain(new_vars.iter()).collect();
    if !free.iter().all(|s| all_known.iter().any(|k| k.id() == s.id())) {
        return Class::Remainder;
    }
    let touches_new = free.iter().any(|s| new_vars.iter().any(|n| n.id() == s.id()));
    let touches_old = free.iter().any(|s| bound_so_far.iter().any(|b| b.id() == s.id()));
    match (touches_new, touches_old) {
        (true, false) => Class::NewOnly,
        (true, true) => Class::Both,
        // A closed conjunct (no free variables at all, e.g. a literal
        // `true`) is safe to attach at the new generator alone.
        (false, false) => Class::NewOnly,
        // Touches only variables bound *before* this generator, none of
        // this generator's own. Shouldn't arise given a correctly
        // canonicalized pool (such a conjunct would already have been
        // picked up when its last-needed variable became available), but
        // attaching it here would ask `Select`'s single-row pattern to
        // resolve an identifier it doesn't bind - defer it instead so it
        // gets swept up by the base case, which sees every bound variable.
        (false, true) => Class::Remainder,
    }
}

/// Split `pool` (the remaining unclassified conjuncts) into `(p1, p2,
/// still_remaining)` for the generator just consumed.
pub fn split(pool: Vec<Expr>, w: &Pattern, new_vars: &[Symbol]) -> (Vec<Expr>, Vec<Expr>, Vec<Expr>) {
    let mut p1 = Vec::new();
    let mut p2 = Vec::new();
    let mut rest = Vec::new();
    for e in pool {
        match classify(&e, w, new_vars) {
            Class::NewOnly => p1.push(e),
            Class::Both => p2.push(e),
            Class::Remainder => rest.push(e),
        }
    }
    (p1, p2, rest)
}

#[cfg(test)]
#[path = "tests/split.rs"]
mod tests;
