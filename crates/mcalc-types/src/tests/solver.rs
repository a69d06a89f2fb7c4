use std::rc::Rc;

use mcalc_common::{Span, SymbolGenerator};
use rustc_hash::FxHashMap;

use super::*;
use crate::monoid::Monoid;
use crate::record::{Attribute, RecordAttributes};
use crate::ty::Type;

fn new_solver() -> TypeSolver {
    TypeSolver::new(Rc::new(SymbolGenerator::new()), FxHashMap::default())
}

fn dummy() -> Span {
    Span::synthetic()
}

#[test]
fn unifies_equal_primitives() {
    let mut s = new_solver();
    assert!(s.unify(&Type::Int, &Type::Int, dummy(), dummy()).is_ok());
}

#[test]
fn rejects_incompatible_primitives() {
    let mut s = new_solver();
    assert!(s.unify(&Type::Int, &Type::Bool, dummy(), dummy()).is_err());
}

#[test]
fn type_variable_unifies_with_concrete_type() {
    let mut s = new_solver();
    let tv = s.fresh_type_var();
    s.unify(&tv, &Type::String, dummy(), dummy()).unwrap();
    let walked = s.walk(&tv);
    assert_eq!(walked, Type::String);
}

#[test]
fn walk_is_idempotent() {
    let mut s = new_solver();
    let tv = s.fresh_type_var();
    s.unify(&tv, &Type::Int, dummy(), dummy()).unwrap();
    let once = s.walk(&tv);
    let twice = s.walk(&once);
    assert_eq!(once, twice);
}

#[test]
fn number_type_rejects_string() {
    let mut s = new_solver();
    let sym = s.symbols.fresh("n");
    let nv = Type::NumberType(sym);
    assert!(s.unify(&nv, &Type::String, dummy(), dummy()).is_err());
}

#[test]
fn number_type_accepts_int() {
    let mut s = new_solver();
    let sym = s.symbols.fresh("n");
    let nv = Type::NumberType(sym);
    assert!(s.unify(&nv, &Type::Int, dummy(), dummy()).is_ok());
}

#[test]
fn collections_unify_monoid_and_inner() {
    let mut s = new_solver();
    let a = Type::collection(Monoid::Set, Type::Int);
    let b = Type::collection(Monoid::Set, Type::Int);
    assert!(s.unify(&a, &b, dummy(), dummy()).is_ok());

    let c = Type::collection(Monoid::List, Type::Int);
    assert!(s.unify(&a, &c, dummy(), dummy()).is_err());
}

#[test]
fn monoid_variable_narrows_to_list_never_to_set() {
    let mut s = new_solver();
    let mv = s.fresh_monoid_var();
    s.unify_monoids(&mv, &Monoid::List, dummy()).unwrap();
    let walked = s.walk_monoid(&mv);
    assert_eq!(walked, Monoid::List);
    // Further requiring Set compatibility must now fail (§8 invariant 4).
    assert!(s.unify_monoids(&mv, &Monoid::Set, dummy()).is_err());
}

#[test]
fn attributes_records_unify_field_by_field() {
    let mut s = new_solver();
    let sym_a = s.symbols.declare("a");
    let r1 = RecordAttributes::Attributes(vec![Attribute::new(sym_a.clone(), Type::Int)]);
    let r2 = RecordAttributes::Attributes(vec![Attribute::new(sym_a, Type::Int)]);
    assert!(s.unify_attributes(&r1, &r2, dummy(), dummy()).is_ok());
}

#[test]
fn attributes_variable_is_subset_of_fixed_record() {
    let mut s = new_solver();
    let sym_a = s.symbols.declare("a");
    let var_sym = s.symbols.fresh("r");
    let open = RecordAttributes::AttributesVariable(vec![Attribute::new(sym_a.clone(), Type::Int)], var_sym);
    let sym_b = s.symbols.declare("b");
    let closed = RecordAttributes::Attributes(vec![
        Attribute::new(sym_a, Type::Int),
        Attribute::new(sym_b, Type::String),
    ]);
    assert!(s.unify_attributes(&open, &closed, dummy(), dummy()).is_ok());
}

#[test]
fn attributes_variable_missing_field_fails() {
    let mut s = new_solver();
    let sym_missing = s.symbols.declare("missing");
    let var_sym = s.symbols.fresh("r");
    let open = RecordAttributes::AttributesVariable(vec![Attribute::new(sym_missing, Type::Int)], var_sym);
    let closed = RecordAttributes::Attributes(vec![]);
    assert!(s.unify_attributes(&open, &closed, dummy(), dummy()).is_err());
}

#[test]
fn scheme_with_no_free_symbols_instantiates_to_same_body() {
    let mut s = new_solver();
    let scheme = crate::ty::TypeScheme::monomorphic(Type::Int);
    assert_eq!(s.instantiate(&scheme), Type::Int);
}

#[test]
fn generalize_then_instantiate_produces_fresh_variables_per_use() {
    let mut s = new_solver();
    let watermark = s.snapshot();
    let tv = s.fresh_type_var();
    let scheme = s.generalize(watermark, &tv);
    assert!(!scheme.is_monomorphic());
    let use1 = s.instantiate(&scheme);
    let use2 = s.instantiate(&scheme);
    assert_ne!(use1, use2, "each instantiation should get independent fresh variables");
}
