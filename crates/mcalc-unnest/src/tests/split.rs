use std::rc::Rc;

use mcalc_ast::{Builder, NodeIdGenerator, Pattern as AstPattern, Qualifier};
use mcalc_common::{Span, SymbolGenerator};
use mcalc_types::{Monoid, Type};

use super::*;
use crate::pattern::Pattern;

fn dummy() -> Span {
    Span::synthetic()
}

#[test]
fn closed_conjunct_is_new_only() {
    let symbols = SymbolGenerator::new();
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, Rc::new(symbols));

    let lit = b.bool_const(true, dummy());
    let new_var = b.symbols.fresh("v");
    let w = Pattern::Empty;

    assert_eq!(split::classify(&lit, &w, &[new_var]), split::Class::NewOnly);
}

#[test]
fn new_generator_only_conjunct_is_new_only() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, symbols.clone());

    let v = symbols.declare("v");
    let idn = b.idn(v.clone(), dummy());
    let w = Pattern::Empty;

    assert_eq!(split::classify(&idn, &w, &[v]), split::Class::NewOnly);
}

#[test]
fn old_variables_only_conjunct_is_deferred_not_attached() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, symbols.clone());

    let old = symbols.declare("old");
    let new = symbols.declare("new");
    let idn = b.idn(old.clone(), dummy());
    let w = Pattern::Variable(old, Type::Int);

    assert_eq!(
        split::classify(&idn, &w, &[new]),
        split::Class::Remainder,
        "a conjunct over only already-bound variables must not be attached to the new generator's own Select"
    );
}

#[test]
fn conjunct_touching_both_old_and_new_is_both() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, symbols.clone());

    let old = symbols.declare("old");
    let new = symbols.declare("new");
    let l = b.idn(old.clone(), dummy());
    let r = b.idn(new.clone(), dummy());
    let eq = b.binary(mcalc_ast::BinaryOp::Eq, l, r, dummy());
    let w = Pattern::Variable(old, Type::Int);

    assert_eq!(split::classify(&eq, &w, &[new]), split::Class::Both);
}

#[test]
fn conjunct_with_nested_comprehension_is_deferred() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, symbols.clone());

    let new = symbols.declare("new");
    let inner_gen_var = symbols.declare("inner");
    let src = b.idn(symbols.declare("ys"), dummy());
    let gen = Qualifier::Gen(Some(AstPattern::Idn(inner_gen_var.clone(), dummy())), src);
    let body = b.idn(inner_gen_var, dummy());
    let nested = b.comp(Monoid::Set, vec![gen], body, dummy());
    let w = Pattern::Empty;

    assert_eq!(split::classify(&nested, &w, &[new]), split::Class::Remainder);
}

#[test]
fn split_partitions_pool_into_three_classes() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids, symbols.clone());

    let old = symbols.declare("old");
    let new = symbols.declare("new");
    let w = Pattern::Variable(old.clone(), Type::Int);

    let new_only = b.idn(new.clone(), dummy());
    let both = b.binary(mcalc_ast::BinaryOp::Eq, b.idn(old, dummy()), b.idn(new.clone(), dummy()), dummy());
    let unrelated = b.bool_const(true, dummy());

    let pool = vec![new_only.clone(), both.clone(), unrelated.clone()];
    let (p1, p2, rest) = split::split(pool, &w, &[new]);

    assert_eq!(p1.len(), 2, "the closed literal and the new-only conjunct both land in p1");
    assert_eq!(p2.len(), 1);
    assert!(rest.is_empty());
    assert!(p2.iter().any(|e| Rc::ptr_eq(e, &both)));
}
