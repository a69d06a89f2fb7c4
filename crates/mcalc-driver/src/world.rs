//! `World` validation (§11 "A `World` builder / validation step"): checks
//! the catalog's `tipes` map for unresolvable `UserType` references before
//! a compile starts, surfacing them as `CalculusError::UnknownDecl` early
//! rather than deep inside unification (§3.5 "the catalog is read-only",
//! §9 "Cyclic type references").
//!
//! This only checks *reachability* of every `UserType` symbol mentioned by
//! the catalog's own types - actual cycle detection is the occurs-check
//! `TypeSolver` already performs during unification (§9), since a cycle is
//! only a problem once something tries to expand it past
//! `mcalc_common::limits::MAX_TYPE_EXPANSION_DEPTH`.

use mcalc_ast::World;
use mcalc_common::{CalculusError, Span, Symbol};
use mcalc_types::{RecordAttributes, Type};
use rustc_hash::FxHashSet;

/// Walk every type reachable from `world.sources` and `world.tipes`,
/// reporting one `UnknownDecl` per distinct `UserType` symbol that isn't a
/// key of `world.tipes`.
#[must_use]
pub fn validate(world: &World) -> Vec<CalculusError> {
    let mut seen_unresolved: FxHashSet<Symbol> = FxHashSet::default();
    let mut errors = Vec::new();
    for ty in world.sources.values() {
        walk_type(ty, world, &mut seen_unresolved, &mut errors);
    }
    for ty in world.tipes.values() {
        walk_type(ty, world, &mut seen_unresolved, &mut errors);
    }
    errors
}

fn walk_type(ty: &Type, world: &World, seen: &mut FxHashSet<Symbol>, errors: &mut Vec<CalculusError>) {
    match ty {
        Type::UserType(sym) => {
            if !world.tipes.contains_key(sym) && seen.insert(sym.clone()) {
                errors.push(CalculusError::UnknownDecl {
                    idn: sym.name().to_string(),
                    pos: Span::synthetic(),
                });
            }
        }
        Type::Collection(_, inner) => {
            walk_type(inner, world, seen, errors);
        }
        Type::Fun(p, r) => {
            walk_type(p, world, seen, errors);
            walk_type(r, world, seen, errors);
        }
        Type::Pattern(items) => {
            for t in items {
                walk_type(t, world, seen, errors);
            }
        }
        Type::Record(atts) => walk_record(atts, world, seen, errors),
        _ => {}
    }
}

fn walk_record(atts: &RecordAttributes, world: &World, seen: &mut FxHashSet<Symbol>, errors: &mut Vec<CalculusError>) {
    match atts {
        RecordAttributes::Attributes(fields) | RecordAttributes::AttributesVariable(fields, _) => {
            for f in fields {
                walk_type(&f.ty, world, seen, errors);
            }
        }
        RecordAttributes::ConcatAttributes(_) => {}
    }
}
