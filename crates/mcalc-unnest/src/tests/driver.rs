use std::rc::Rc;

use mcalc_ast::{Builder, ExprKind, NodeIdGenerator, Pattern as AstPattern, Qualifier};
use mcalc_canon::CanonCtx;
use mcalc_common::{CalculusError, Span, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};

use super::*;
use crate::{AlgExpr, AlgebraNode, UnnestCtx};

fn dummy() -> Span {
    Span::synthetic()
}

fn student_ty(symbols: &SymbolGenerator) -> Type {
    Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("name"), Type::String),
        Attribute::new(symbols.declare("age"), Type::Int),
    ]))
}

fn fresh_ctx() -> (Builder, Rc<SymbolGenerator>, CanonCtx) {
    let symbols = Rc::new(SymbolGenerator::new());
    let ids = Rc::new(NodeIdGenerator::new());
    let b = Builder::new(ids.clone(), symbols.clone());
    let ctx = CanonCtx {
        builder: Builder::new(ids, symbols.clone()),
        symbols: symbols.clone(),
        types: Default::default(),
    };
    (b, symbols, ctx)
}

/// Rules C4 and C5: a single generator over a catalog source, one
/// predicate conjunct attached directly to its `Select`, `Reduce` as the
/// base case.
#[test]
fn single_generator_filter_becomes_scan_select_reduce() {
    let (b, symbols, mut ctx) = fresh_ctx();
    let students = symbols.declare("students");
    let s = symbols.declare("s");
    let elem_ty = student_ty(&symbols);

    let src = b.idn(students, dummy());
    ctx.types.insert(src.id, elem_ty.clone());

    let age = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("age")));
    let pred = b.mk(
        dummy(),
        ExprKind::BinaryExp(mcalc_ast::BinaryOp::Gt, age, b.mk(dummy(), ExprKind::IntConst(20))),
    );
    let gen = Qualifier::Gen(Some(AstPattern::Idn(s.clone(), dummy())), src);
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen, Qualifier::Exp(pred)], b.idn(s, dummy())));

    let mut unnest_ctx = UnnestCtx::new(ctx);
    let algebra = unnest(&comp, &mut unnest_ctx).expect("unnest should succeed");

    match algebra {
        AlgebraNode::Reduce { monoid: Monoid::Set, child, pred, .. } => {
            assert!(!pred.is_trivially_true(), "the age>20 conjunct should be the reduce predicate, not baked into the scan");
            match *child {
                AlgebraNode::Select { child, .. } => {
                    assert!(matches!(*child, AlgebraNode::Scan { .. }));
                }
                other => panic!("expected Select over Scan, got {other:?}"),
            }
        }
        other => panic!("expected Reduce, got {other:?}"),
    }
}

/// Rule C6: a second generator correlated to the first joins rather than
/// re-scanning independently.
#[test]
fn two_generators_with_correlating_predicate_become_join() {
    let (b, symbols, mut ctx) = fresh_ctx();
    let students = symbols.declare("students");
    let enrollments = symbols.declare("enrollments");
    let s = symbols.declare("s");
    let e = symbols.declare("e");

    let student_ty_ = student_ty(&symbols);
    let enrollment_ty = Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("studentName"), Type::String),
        Attribute::new(symbols.declare("course"), Type::String),
    ]));

    let s_src = b.idn(students, dummy());
    ctx.types.insert(s_src.id, student_ty_.clone());
    let e_src = b.idn(enrollments, dummy());
    ctx.types.insert(e_src.id, enrollment_ty.clone());

    let name = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("name")));
    let student_name = b.mk(
        dummy(),
        ExprKind::RecordProj(b.idn(e.clone(), dummy()), symbols.declare("studentName")),
    );
    let corr = b.mk(dummy(), ExprKind::BinaryExp(mcalc_ast::BinaryOp::Eq, name, student_name));

    let gen_s = Qualifier::Gen(Some(AstPattern::Idn(s.clone(), dummy())), s_src);
    let gen_e = Qualifier::Gen(Some(AstPattern::Idn(e.clone(), dummy())), e_src);
    let body = b.mk(
        dummy(),
        ExprKind::RecordCons(vec![
            mcalc_ast::RecordField { idn: symbols.declare("s"), value: b.idn(s.clone(), dummy()) },
            mcalc_ast::RecordField { idn: symbols.declare("e"), value: b.idn(e.clone(), dummy()) },
        ]),
    );
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::List, vec![gen_s, gen_e, Qualifier::Exp(corr)], body),
    );

    let mut unnest_ctx = UnnestCtx::new(ctx);
    let algebra = unnest(&comp, &mut unnest_ctx).expect("unnest should succeed");

    match algebra {
        AlgebraNode::Reduce { monoid: Monoid::List, child, .. } => {
            assert!(matches!(*child, AlgebraNode::Join { .. }), "correlated second generator should join, got {child:?}");
        }
        other => panic!("expected Reduce, got {other:?}"),
    }
}

/// Rule C11/C12: an independent nested comprehension (no shared generator
/// variables with the outer scope) hoists via `OuterJoin` rather than
/// failing as an unsupported correlated shape.
#[test]
fn independent_nested_comprehension_hoists_via_outer_join() {
    let (b, symbols, mut ctx) = fresh_ctx();
    let students = symbols.declare("students");
    let others = symbols.declare("others");
    let s = symbols.declare("s");
    let o = symbols.declare("o");

    let student_ty_ = student_ty(&symbols);
    let other_ty = Type::Int;

    let s_src = b.idn(students, dummy());
    ctx.types.insert(s_src.id, student_ty_.clone());
    let o_src = b.idn(others, dummy());
    ctx.types.insert(o_src.id, other_ty.clone());

    let gen_o = Qualifier::Gen(Some(AstPattern::Idn(o.clone(), dummy())), o_src);
    let inner_pred = b.bool_const(true, dummy());
    let inner_comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::Set, vec![gen_o, Qualifier::Exp(inner_pred)], b.idn(o, dummy())),
    );
    ctx.types.insert(inner_comp.id, Type::collection(Monoid::Set, Type::Int));

    let gen_s = Qualifier::Gen(Some(AstPattern::Idn(s.clone(), dummy())), s_src);
    let outer_pred = b.bool_const(true, dummy());
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::Set, vec![gen_s, Qualifier::Exp(outer_pred)], inner_comp),
    );

    let mut unnest_ctx = UnnestCtx::new(ctx);
    let algebra = unnest(&comp, &mut unnest_ctx).expect("unnest should succeed");

    match algebra {
        AlgebraNode::Reduce { child, .. } => {
            assert!(matches!(*child, AlgebraNode::OuterJoin { .. }), "an independent nested comprehension should hoist via OuterJoin, got {child:?}");
        }
        other => panic!("expected Reduce, got {other:?}"),
    }
}

/// A malformed canonical shape (here, a `Comp` whose qualifiers have no
/// trailing predicate at all) is an internal-error bug, not a user error -
/// `decompose_canonical_comp`'s own contract.
#[test]
fn malformed_canonical_comp_is_internal_error() {
    let (b, symbols, ctx) = fresh_ctx();
    let s = symbols.declare("s");
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![], b.idn(s, dummy())));

    let mut unnest_ctx = UnnestCtx::new(ctx);
    let err = unnest(&comp, &mut unnest_ctx).expect_err("missing trailing predicate should fail");
    assert!(matches!(err, CalculusError::InternalError { .. }));
}

/// Rules C9/C10: a nested comprehension correlated to the outer generator
/// (here, sitting in yield position rather than failing as an unsupported
/// shape) hoists through an `OuterJoin` and closes with `Nest` keyed on the
/// outer variable, rather than reporting an internal error.
#[test]
fn correlated_nested_comprehension_in_yield_position_hoists_via_nest() {
    let (b, symbols, mut ctx) = fresh_ctx();
    let students = symbols.declare("students");
    let enrollments = symbols.declare("enrollments");
    let s = symbols.declare("s");
    let e = symbols.declare("e");

    let student_ty_ = student_ty(&symbols);
    let enrollment_ty = Type::record(RecordAttributes::Attributes(vec![
        Attribute::new(symbols.declare("studentName"), Type::String),
        Attribute::new(symbols.declare("course"), Type::String),
    ]));

    let s_src = b.idn(students, dummy());
    ctx.types.insert(s_src.id, student_ty_.clone());
    let e_src = b.idn(enrollments, dummy());
    ctx.types.insert(e_src.id, enrollment_ty.clone());

    let name = b.mk(dummy(), ExprKind::RecordProj(b.idn(s.clone(), dummy()), symbols.declare("name")));
    let student_name = b.mk(
        dummy(),
        ExprKind::RecordProj(b.idn(e.clone(), dummy()), symbols.declare("studentName")),
    );
    let corr = b.mk(dummy(), ExprKind::BinaryExp(mcalc_ast::BinaryOp::Eq, name, student_name));
    let gen_e = Qualifier::Gen(Some(AstPattern::Idn(e.clone(), dummy())), e_src);
    let course = b.mk(dummy(), ExprKind::RecordProj(b.idn(e, dummy()), symbols.declare("course")));
    let inner_comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen_e, Qualifier::Exp(corr)], course));
    ctx.types.insert(inner_comp.id, Type::collection(Monoid::Set, Type::String));

    let gen_s = Qualifier::Gen(Some(AstPattern::Idn(s.clone(), dummy())), s_src);
    let outer_pred = b.bool_const(true, dummy());
    let body = b.mk(
        dummy(),
        ExprKind::RecordCons(vec![
            mcalc_ast::RecordField { idn: symbols.declare("s"), value: b.idn(s.clone(), dummy()) },
            mcalc_ast::RecordField { idn: symbols.declare("courses"), value: inner_comp },
        ]),
    );
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(Monoid::Set, vec![gen_s, Qualifier::Exp(outer_pred)], body),
    );

    let mut unnest_ctx = UnnestCtx::new(ctx);
    let algebra = unnest(&comp, &mut unnest_ctx).expect("unnest should succeed");

    match algebra {
        AlgebraNode::Reduce { child, .. } => match *child {
            AlgebraNode::Nest { child, .. } => {
                assert!(
                    matches!(*child, AlgebraNode::OuterJoin { .. }),
                    "a generator correlated to the outer row should join with its outer variant, got {child:?}"
                );
            }
            other => panic!("a correlated nested comprehension should close with Nest, got {other:?}"),
        },
        other => panic!("expected Reduce, got {other:?}"),
    }
}

#[test]
fn algexpr_and_short_circuits_on_trivial_true() {
    let lhs = AlgExpr::BoolConst(true);
    let rhs = AlgExpr::BoolConst(false);
    assert_eq!(lhs.and(rhs.clone()), rhs);
    assert_eq!(AlgExpr::bool_true().and(AlgExpr::bool_true()), AlgExpr::bool_true());
}
