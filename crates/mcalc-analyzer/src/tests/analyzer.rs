use std::rc::Rc;

use mcalc_ast::{Builder, ExprKind, NodeIdGenerator, Pattern, Qualifier, World};
use mcalc_common::{CalculusError, Span, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};

use crate::analyzer::analyze;

fn dummy() -> Span {
    Span::synthetic()
}

fn student_type(symbols: &SymbolGenerator) -> Type {
    Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("name"), Type::String),
        Attribute::new(symbols.declare("age"), Type::Int),
    ]))
}

#[test]
fn simple_filter_infers_set_of_student() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("students", student_type(&symbols));

    let s = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), gen_src);
    let age = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("age")));
    let pred = b.mk(
        dummy(),
        ExprKind::BinaryExp(mcalc_ast::BinaryOp::Gt, age, b.mk(dummy(), ExprKind::IntConst(20))),
    );
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::Set, vec![gen, Qualifier::Exp(pred)], b.idn(s, dummy())),
    );

    let result = analyze(&comp, world, symbols);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    match &result.root_type {
        Type::Collection(Monoid::Set, inner) => assert!(inner.is_record()),
        other => panic!("expected Collection(Set, Record), got {other}"),
    }
}

#[test]
fn bad_monoid_reports_incompatible_monoids() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("setOfThings", Type::collection(Monoid::Set, Type::Int));

    let s = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("setOfThings"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), gen_src);
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::List, vec![gen], b.idn(s, dummy())));

    let result = analyze(&comp, world, symbols);
    assert!(result.errors.iter().any(|e| matches!(e, CalculusError::IncompatibleMonoids { .. })));
}

#[test]
fn unknown_identifier_reports_unknown_decl() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("students", student_type(&symbols));

    let s = symbols.declare("s");
    let t = symbols.declare("t");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s, dummy())), gen_src);
    let name = b.mk(dummy(), ExprKind::RecordProj(b.idn(t, dummy()), symbols.declare("name")));
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen], name));

    let result = analyze(&comp, world, symbols);
    assert!(result.errors.iter().any(|e| matches!(e, CalculusError::UnknownDecl { .. })));
}

#[test]
fn tuple_pattern_lambda_accepts_record_literal_argument() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new();

    let x = symbols.declare("x");
    let y = symbols.declare("y");
    let param = Pattern::Prod(
        vec![Pattern::Idn(x.clone(), dummy()), Pattern::Idn(y, dummy())],
        dummy(),
    );
    let lambda = b.mk(dummy(), ExprKind::FunAbs(param, b.idn(x, dummy())));

    let record = b.mk(
        dummy(),
        ExprKind::RecordCons(vec![
            mcalc_ast::RecordField { idn: symbols.declare("a"), value: b.mk(dummy(), ExprKind::IntConst(1)) },
            mcalc_ast::RecordField { idn: symbols.declare("b"), value: b.mk(dummy(), ExprKind::IntConst(2)) },
        ]),
    );
    let app = b.mk(dummy(), ExprKind::FunApp(lambda, record));

    let result = analyze(&app, world, symbols);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.root_type, Type::Int);
}
