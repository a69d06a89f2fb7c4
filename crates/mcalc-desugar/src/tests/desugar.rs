use std::rc::Rc;

use mcalc_ast::{BinaryOp, Builder, ExprKind, NodeIdGenerator, Pattern, Qualifier, World};
use mcalc_common::{Span, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};

use crate::desugar;
use mcalc_analyzer::analyze;

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
fn sum_over_set_inserts_to_bag() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let world = World::new().with_source("ages", Type::collection(Monoid::Set, Type::Int));

    let gen_src = b.idn(symbols.declare("ages"), dummy());
    let sum = b.mk(dummy(), ExprKind::Sum(gen_src));

    let analysis = analyze(&sum, world, symbols.clone());
    assert!(analysis.errors.is_empty(), "unexpected errors: {:?}", analysis.errors);

    let result = desugar(&sum, &analysis, ids, symbols);
    match &result.expr.kind {
        ExprKind::Comp(Monoid::Sum, qs, body) => {
            assert_eq!(qs.len(), 1);
            match &qs[0] {
                Qualifier::Gen(Some(Pattern::Idn(_, _)), src) => {
                    assert!(matches!(src.kind, ExprKind::UnaryExp(mcalc_ast::UnaryOp::ToBag, _)));
                }
                other => panic!("expected a single generator, got {other:?}"),
            }
            assert!(matches!(body.kind, ExprKind::IdnExp(_)));
        }
        other => panic!("expected Comp(Sum, ...), got {other:?}"),
    }
}

#[test]
fn exists_lowers_to_or_comprehension() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let world = World::new().with_source("students", student_type(&symbols));

    let s = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s, dummy())), gen_src);
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen], b.bool_const(true, dummy())));
    let exists = b.mk(dummy(), ExprKind::Exists(comp));

    let analysis = analyze(&exists, world, symbols.clone());
    assert!(analysis.errors.is_empty());

    let result = desugar(&exists, &analysis, ids, symbols);
    assert!(matches!(result.expr.kind, ExprKind::Comp(Monoid::Or, ..)));
}

#[test]
fn in_exp_lowers_to_membership_comprehension() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let world = World::new().with_source("ages", Type::collection(Monoid::Set, Type::Int));

    let needle = b.mk(dummy(), ExprKind::IntConst(30));
    let haystack = b.idn(symbols.declare("ages"), dummy());
    let in_exp = b.mk(dummy(), ExprKind::InExp(needle, haystack));

    let analysis = analyze(&in_exp, world, symbols.clone());
    assert!(analysis.errors.is_empty());

    let result = desugar(&in_exp, &analysis, ids, symbols);
    match &result.expr.kind {
        ExprKind::Comp(Monoid::Or, qs, body) => {
            assert_eq!(qs.len(), 1);
            assert!(matches!(body.kind, ExprKind::BinaryExp(BinaryOp::Eq, _, _)));
        }
        other => panic!("expected Comp(Or, ...), got {other:?}"),
    }
}

#[test]
fn expblock_binds_are_inlined_away() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let world = World::new();

    let x = symbols.declare("x");
    let one = b.mk(dummy(), ExprKind::IntConst(1));
    let body = b.mk(
        dummy(),
        ExprKind::BinaryExp(BinaryOp::Add, b.idn(x.clone(), dummy()), b.mk(dummy(), ExprKind::IntConst(2))),
    );
    let block = b.mk(dummy(), ExprKind::ExpBlock(vec![(Pattern::Idn(x, dummy()), one)], body));

    let analysis = analyze(&block, world, symbols.clone());
    assert!(analysis.errors.is_empty());

    let result = desugar(&block, &analysis, ids, symbols);
    assert!(!matches!(result.expr.kind, ExprKind::ExpBlock(..)));
    assert!(matches!(result.expr.kind, ExprKind::BinaryExp(BinaryOp::Add, ..)));
}

#[test]
fn group_by_select_substitutes_partition_with_subquery() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let world = World::new().with_source("students", student_type(&symbols));

    let s_sym = symbols.declare("s");
    let gen_src = b.idn(symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s_sym.clone(), dummy())), gen_src);
    let age = b.mk(
        dummy(),
        ExprKind::RecordProj(b.idn(s_sym, dummy()), symbols.declare("age")),
    );
    let partition = b.mk(dummy(), ExprKind::Partition);
    let count = b.mk(dummy(), ExprKind::Count(partition));
    let n_field = mcalc_ast::RecordField { idn: symbols.declare("n"), value: count };
    let proj = b.mk(dummy(), ExprKind::RecordCons(vec![n_field]));

    let select = mcalc_ast::Select {
        from: vec![gen],
        distinct: false,
        group_by: Some(age),
        proj,
        where_: None,
        order_by: Vec::new(),
        having: None,
    };
    let select_expr = b.mk(dummy(), ExprKind::Select(Box::new(select)));

    let analysis = analyze(&select_expr, world, symbols.clone());
    assert!(analysis.errors.is_empty(), "unexpected errors: {:?}", analysis.errors);

    let result = desugar(&select_expr, &analysis, ids, symbols);
    match &result.expr.kind {
        ExprKind::Comp(_, qs, body) => {
            assert_eq!(qs.len(), 1, "group-by select keeps the original FROM as its only qualifier");
            assert!(matches!(body.kind, ExprKind::RecordCons(_)));
        }
        other => panic!("expected a Comp, got {other:?}"),
    }
}
