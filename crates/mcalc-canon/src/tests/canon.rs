use std::rc::Rc;

use mcalc_ast::{BinaryOp, Builder, ExprKind, NodeIdGenerator, Pattern, Qualifier};
use mcalc_common::{Span, SymbolGenerator};
use mcalc_types::Monoid;
use rustc_hash::FxHashMap;

use super::*;

fn dummy() -> Span {
    Span::synthetic()
}

#[test]
fn nested_same_monoid_comprehension_is_flattened() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());

    let x = symbols.declare("x");
    let y = symbols.declare("y");

    let inner_src = b.idn(symbols.declare("ys"), dummy());
    let inner_gen = Qualifier::Gen(Some(Pattern::Idn(y.clone(), dummy())), inner_src);
    let inner_body = b.idn(y, dummy());
    let inner_comp = b.comp(Monoid::Set, vec![inner_gen], inner_body, dummy());

    let outer_src = b.idn(symbols.declare("xs"), dummy());
    let outer_gen = Qualifier::Gen(Some(Pattern::Idn(x, dummy())), outer_src);
    let outer_comp = b.comp(Monoid::Set, vec![outer_gen], inner_comp, dummy());

    let result = canonicalize(&outer_comp, FxHashMap::default(), ids, symbols);
    match &result.expr.kind {
        ExprKind::Comp(Monoid::Set, qs, body) => {
            assert_eq!(qs.len(), 3, "outer gen + inner gen + one trailing predicate");
            assert!(matches!(qs.last(), Some(Qualifier::Exp(_))));
            assert!(matches!(body.kind, ExprKind::IdnExp(_)));
        }
        other => panic!("expected a flattened Comp(Set, ...), got {other:?}"),
    }
}

#[test]
fn decompose_canonical_comp_extracts_generator_path() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());

    let s = symbols.declare("s");
    let students = symbols.declare("students");
    let gen_src = b.idn(students.clone(), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), gen_src);
    let pred = b.bool_const(true, dummy());
    let body = b.idn(s.clone(), dummy());
    let comp = b.comp(Monoid::Set, vec![gen, Qualifier::Exp(pred)], body, dummy());

    let result = canonicalize(&comp, FxHashMap::default(), ids, symbols.clone());
    let decompose_ctx = CanonCtx {
        builder: Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone()),
        symbols,
        types: result.types.clone(),
    };
    let (m, gens, _pred, _body) = decompose_canonical_comp(&result.expr, &decompose_ctx).unwrap();
    assert_eq!(m, Monoid::Set);
    assert_eq!(gens.len(), 1);
    assert_eq!(gens[0].var, s);
    assert_eq!(gens[0].path.root(), &students);
}

#[test]
fn comp_with_or_over_and_predicate_is_rewritten_to_cnf() {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());

    let x = symbols.declare("x");
    let gen_src = b.idn(symbols.declare("xs"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(x.clone(), dummy())), gen_src);

    let a = b.idn(symbols.declare("a"), dummy());
    let c1 = b.idn(symbols.declare("c1"), dummy());
    let c2 = b.idn(symbols.declare("c2"), dummy());
    let and = b.binary(BinaryOp::And, c1, c2, dummy());
    let or = b.binary(BinaryOp::Or, a, and, dummy());

    let body = b.idn(x, dummy());
    let comp = b.comp(Monoid::Set, vec![gen, Qualifier::Exp(or)], body, dummy());

    let result = canonicalize(&comp, FxHashMap::default(), ids, symbols);
    match &result.expr.kind {
        ExprKind::Comp(_, qs, _) => match qs.last() {
            Some(Qualifier::Exp(pred)) => {
                assert!(matches!(pred.kind, ExprKind::BinaryExp(BinaryOp::And, ..)));
            }
            other => panic!("expected a trailing predicate qualifier, got {other:?}"),
        },
        other => panic!("expected a Comp, got {other:?}"),
    }
}
