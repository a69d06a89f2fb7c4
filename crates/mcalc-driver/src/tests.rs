use std::rc::Rc;

use mcalc_ast::{Builder, ExprKind, NodeIdGenerator, Pattern, Qualifier, World};
use mcalc_common::{CalculusError, SymbolGenerator};
use mcalc_types::{Monoid, Type};

use super::*;

fn dummy() -> mcalc_common::Span {
    mcalc_common::Span::synthetic()
}

#[test]
fn compile_result_is_ok_reflects_error_list() {
    let ok = CompileResult { algebra: None, ty: None, errors: Vec::new() };
    assert!(ok.is_ok());

    let err = CompileResult {
        algebra: None,
        ty: None,
        errors: vec![CalculusError::UnknownDecl { idn: "x".into(), pos: dummy() }],
    };
    assert!(!err.is_ok());
}

#[test]
fn compile_options_builder_overrides_default() {
    let opts = CompileOptions::new().with_max_unification_depth(4);
    assert_eq!(opts.max_unification_depth, 4);
    assert_ne!(opts, CompileOptions::default());
}

/// `World` validation runs before semantic analysis: an unresolvable
/// `UserType` in the catalog itself is reported immediately, with no
/// algebra and no attempt to analyze `root`.
#[test]
fn compile_reports_world_validation_errors_before_analysis() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let dangling = symbols.declare("Missing");
    let world = World::new().with_source("things", Type::UserType(dangling));

    let root = b.bool_const(true, dummy());
    let result = compile(&root, world, CompileOptions::default());

    assert!(!result.is_ok());
    assert!(result.algebra.is_none());
    assert!(result.ty.is_none(), "world validation failures short-circuit before a root type is ever inferred");
    assert!(result.errors.iter().any(|e| matches!(e, CalculusError::UnknownDecl { .. })));
}

/// A trivial single-generator scan with no predicate compiles end to end.
#[test]
fn compile_smoke_test_plain_scan() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let world = World::new().with_source("things", Type::collection(Monoid::Set, Type::Int));

    let x = symbols.declare("x");
    let gen = Qualifier::Gen(Some(Pattern::Idn(x.clone(), dummy())), b.idn(symbols.declare("things"), dummy()));
    let comp = b.mk(dummy(), ExprKind::Comp(Monoid::Set, vec![gen], b.idn(x, dummy())));

    let result = compile(&comp, world, CompileOptions::default());
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors);
    assert!(result.algebra.is_some());
    assert!(result.ty.is_some());
}
