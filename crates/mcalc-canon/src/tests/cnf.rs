use std::rc::Rc;

use mcalc_ast::{BinaryOp, Builder, ExprKind, NodeIdGenerator, UnaryOp};
use mcalc_common::{SymbolGenerator, Span};
use mcalc_types::Type;

use super::*;
use crate::CanonCtx;

fn ctx() -> CanonCtx {
    let symbols = Rc::new(SymbolGenerator::new());
    CanonCtx {
        builder: Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone()),
        symbols,
        types: Default::default(),
    }
}

fn dummy() -> Span {
    Span::synthetic()
}

fn bool_var(ctx: &mut CanonCtx, name: &str) -> mcalc_ast::Expr {
    let sym = ctx.symbols.declare(name);
    let e = ctx.builder.idn(sym, dummy());
    ctx.record_type(e.id, Type::Bool);
    e
}

#[test]
fn or_over_and_distributes_into_cnf() {
    let mut c = ctx();
    let a = bool_var(&mut c, "a");
    let b = bool_var(&mut c, "b");
    let d = bool_var(&mut c, "d");

    // a or (b and d) -> (a or b) and (a or d)
    let and = c.builder.binary(BinaryOp::And, b, d, dummy());
    let or = c.builder.binary(BinaryOp::Or, a, and, dummy());

    let result = to_cnf(&or, &mut c);
    match &result.kind {
        ExprKind::BinaryExp(BinaryOp::And, l, r) => {
            assert!(matches!(l.kind, ExprKind::BinaryExp(BinaryOp::Or, ..)));
            assert!(matches!(r.kind, ExprKind::BinaryExp(BinaryOp::Or, ..)));
        }
        other => panic!("expected a top-level And, got {other:?}"),
    }
}

#[test]
fn negated_conjunction_pushes_to_disjunction_of_negations() {
    let mut c = ctx();
    let a = bool_var(&mut c, "a");
    let b = bool_var(&mut c, "b");

    // not(a and b) -> (not a) or (not b)
    let and = c.builder.binary(BinaryOp::And, a, b, dummy());
    let not = c.builder.unary(UnaryOp::Not, and, dummy());

    let result = to_cnf(&not, &mut c);
    match &result.kind {
        ExprKind::BinaryExp(BinaryOp::Or, l, r) => {
            assert!(matches!(l.kind, ExprKind::UnaryExp(UnaryOp::Not, _)));
            assert!(matches!(r.kind, ExprKind::UnaryExp(UnaryOp::Not, _)));
        }
        other => panic!("expected a top-level Or of negations, got {other:?}"),
    }
}

#[test]
fn double_negation_is_eliminated() {
    let mut c = ctx();
    let a = bool_var(&mut c, "a");
    let not_a = c.builder.unary(UnaryOp::Not, a, dummy());
    let not_not_a = c.builder.unary(UnaryOp::Not, not_a, dummy());

    let result = to_cnf(&not_not_a, &mut c);
    assert!(matches!(result.kind, ExprKind::IdnExp(_)));
}

#[test]
fn empty_predicate_list_conjoins_to_true() {
    let mut c = ctx();
    let result = conjoin_cnf(&[], dummy(), &mut c);
    assert!(matches!(result.kind, ExprKind::BoolConst(true)));
}

#[test]
fn collect_conjuncts_flattens_nested_ands() {
    let mut c = ctx();
    let a = bool_var(&mut c, "a");
    let b = bool_var(&mut c, "b");
    let d = bool_var(&mut c, "d");
    let inner = c.builder.binary(BinaryOp::And, a, b, dummy());
    let outer = c.builder.binary(BinaryOp::And, inner, d, dummy());

    assert_eq!(collect_conjuncts(&outer).len(), 3);
}
