//! End-to-end pipeline scenarios, driving `compile()` top to bottom the
//! way `tsz-checker`'s integration tests drive the checker: build a
//! surface tree and a `World`, compile, and assert on the shape of the
//! algebra or the error list `compile()` hands back - never on an
//! intermediate pass's output directly.

use std::rc::Rc;

use mcalc_ast::{BinaryOp, Builder, ExprKind, NodeIdGenerator, Pattern, Qualifier, RecordField, Select, World};
use mcalc_common::{CalculusError, Span, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};
use mcalc_unnest::AlgebraNode;

use mcalc_driver::{compile, CompileOptions};

fn dummy() -> Span {
    Span::synthetic()
}

fn student_record_ty(symbols: &SymbolGenerator) -> Type {
    Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("name"), Type::String),
        Attribute::new(symbols.declare("age"), Type::Int),
    ]))
}

/// Scenario 1: a single-generator filter lowers to `Reduce(Set, s, true,
/// Select(age > 20, Scan("students")))`.
#[test]
fn simple_filter_compiles_to_select_over_scan() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let student_ty = student_record_ty(&symbols);
    let world = World::new().with_source("students", Type::collection(Monoid::Set, student_ty));

    let s = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), gen_src);
    let age = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("age")));
    let pred = b.mk(dummy(), ExprKind::BinaryExp(BinaryOp::Gt, age, b.mk(dummy(), ExprKind::IntConst(20))));
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::Set, vec![gen, Qualifier::Exp(pred)], b.idn(s, dummy())),
    );

    let result = compile(&comp, world, CompileOptions::default());
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    let algebra = result.algebra.expect("a successful compile returns an algebra tree");

    match algebra {
        AlgebraNode::Reduce { monoid: Monoid::Set, child, .. } => match *child {
            AlgebraNode::Select { child, .. } => {
                assert!(matches!(*child, AlgebraNode::Scan { ref source, .. } if source == "students"));
            }
            other => panic!("expected Select over Scan, got {other:?}"),
        },
        other => panic!("expected Reduce(Set, ...), got {other:?}"),
    }
}

/// Scenario 2: two correlated generators over distinct sources lower to a
/// `Join`, not two independent scans.
#[test]
fn correlated_generators_compile_to_join() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let student_ty = student_record_ty(&symbols);
    let enrollment_ty = Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("studentName"), Type::String),
        Attribute::new(symbols.declare("course"), Type::String),
    ]));
    let world = World::new()
        .with_source("students", Type::collection(Monoid::Set, student_ty))
        .with_source("enrollments", Type::collection(Monoid::Bag, enrollment_ty));

    let s = symbols.declare("s");
    let e = symbols.declare("e");
    let gen_s = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), b.idn(symbols.declare("students"), dummy()));
    let gen_e = Qualifier::Gen(Some(Pattern::Idn(e.clone(), dummy())), b.idn(symbols.declare("enrollments"), dummy()));

    let name = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("name")));
    let student_name = b.mk(
        dummy(),
        ExprKind::RecordProj(b.idn(e.clone(), dummy()), symbols.declare("studentName")),
    );
    let corr = b.mk(dummy(), ExprKind::BinaryExp(BinaryOp::Eq, name, student_name));

    let body = b.mk(
        dummy(),
        ExprKind::RecordCons(vec![
            RecordField { idn: symbols.declare("s"), value: b.idn(s, dummy()) },
            RecordField { idn: symbols.declare("e"), value: b.idn(e, dummy()) },
        ]),
    );
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::List, vec![gen_s, gen_e, Qualifier::Exp(corr)], body),
    );

    let result = compile(&comp, world, CompileOptions::default());
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    let algebra = result.algebra.expect("a successful compile returns an algebra tree");

    match algebra {
        AlgebraNode::Reduce { monoid: Monoid::List, child, .. } => {
            assert!(matches!(*child, AlgebraNode::Join { .. }), "expected a Join, got {child:?}");
        }
        other => panic!("expected Reduce(List, ...), got {other:?}"),
    }
}

/// Scenario 3: `SELECT age, count(partition) ... GROUP BY age` lowers
/// directly to a `Nest`, the group-by shortcut (§4.5 rule C8) bypassing
/// the generic `Reduce` base case entirely.
#[test]
fn group_by_count_compiles_to_nest() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let student_ty = student_record_ty(&symbols);
    let world = World::new().with_source("students", Type::collection(Monoid::Set, student_ty));

    let s_sym = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s_sym.clone(), dummy())), gen_src);
    let age = b.mk(dummy(), ExprKind::RecordProj(b.idn(s_sym.clone(), dummy()), symbols.declare("age")));
    let age_key = b.mk(dummy(), ExprKind::RecordProj(b.idn(s_sym, dummy()), symbols.declare("age")));

    let partition = b.mk(dummy(), ExprKind::Partition);
    let count = b.mk(dummy(), ExprKind::Count(partition));
    let key_field = RecordField { idn: symbols.declare("age"), value: age_key };
    let n_field = RecordField { idn: symbols.declare("n"), value: count };
    let proj = b.mk(dummy(), ExprKind::RecordCons(vec![key_field, n_field]));

    let select = Select {
        from: vec![gen],
        distinct: false,
        group_by: Some(age),
        proj,
        where_: None,
        order_by: Vec::new(),
        having: None,
    };
    let select_expr = b.mk(dummy(), ExprKind::Select(Box::new(select)));

    let result = compile(&select_expr, world, CompileOptions::default());
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    let algebra = result.algebra.expect("a successful compile returns an algebra tree");

    match algebra {
        AlgebraNode::Nest { monoid: Monoid::Sum, child, .. } => {
            assert!(
                matches!(*child, AlgebraNode::Scan { .. } | AlgebraNode::Select { .. }),
                "expected the group-by's FROM clause under Nest, got {child:?}"
            );
        }
        other => panic!("expected Nest(Sum, ...), got {other:?}"),
    }
}

/// Scenario 4: a nested comprehension independent of the outer
/// generators hoists via `OuterJoin` (§4.5 rules C11/C12) rather than
/// being rejected as an unsupported correlated shape.
#[test]
fn independent_nested_comprehension_compiles_to_outer_join() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let student_ty = student_record_ty(&symbols);
    let world = World::new()
        .with_source("students", Type::collection(Monoid::Set, student_ty))
        .with_source("others", Type::collection(Monoid::Set, Type::Int));

    let s = symbols.declare("s");
    let o = symbols.declare("o");
    let gen_s = Qualifier::Gen(Some(Pattern::Idn(s, dummy())), b.idn(symbols.declare("students"), dummy()));
    let gen_o = Qualifier::Gen(Some(Pattern::Idn(o.clone(), dummy())), b.idn(symbols.declare("others"), dummy()));
    let inner = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen_o], b.idn(o, dummy())));
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen_s], inner));

    let result = compile(&comp, world, CompileOptions::default());
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    let algebra = result.algebra.expect("a successful compile returns an algebra tree");

    match algebra {
        AlgebraNode::Reduce { child, .. } => {
            assert!(matches!(*child, AlgebraNode::OuterJoin { .. }), "expected an OuterJoin, got {child:?}");
        }
        other => panic!("expected Reduce(...), got {other:?}"),
    }
}

/// Scenario 5: a generator whose source monoid is incompatible with the
/// enclosing comprehension's reports `IncompatibleMonoids` and produces no
/// algebra at all.
#[test]
fn incompatible_monoid_reports_error_and_no_algebra() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("setOfThings", Type::collection(Monoid::Set, Type::Int));

    let s = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("setOfThings"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), gen_src);
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::List, vec![gen], b.idn(s, dummy())));

    let result = compile(&comp, world, CompileOptions::default());
    assert!(!result.is_ok());
    assert!(result.algebra.is_none(), "a failed compile must not produce an algebra tree");
    assert!(result.errors.iter().any(|e| matches!(e, CalculusError::IncompatibleMonoids { .. })));
}

/// Scenario 6: an unresolved identifier reports `UnknownDecl` with a real
/// position and, like scenario 5, no algebra.
#[test]
fn unknown_identifier_reports_error_and_no_algebra() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("students", student_record_ty(&symbols));

    let s = symbols.declare("s");
    let t = symbols.declare("t");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s, dummy())), gen_src);
    let name = b.mk(dummy(), ExprKind::RecordProj(b.idn(t, dummy()), symbols.declare("name")));
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen], name));

    let result = compile(&comp, world, CompileOptions::default());
    assert!(!result.is_ok());
    assert!(result.algebra.is_none());
    assert!(result.errors.iter().any(|e| matches!(e, CalculusError::UnknownDecl { .. })));
}
