use std::rc::Rc;

use mcalc_ast::{Builder, ExprKind, NodeIdGenerator};
use mcalc_common::{SymbolGenerator, Span};

use crate::path::{expr_to_path, Path};

fn dummy() -> Span {
    Span::synthetic()
}

#[test]
fn variable_is_a_root_path() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let s = symbols.declare("s");
    let e = b.idn(s.clone(), dummy());

    let p = expr_to_path(&e).unwrap();
    assert_eq!(p, Path::Variable(s));
}

#[test]
fn record_proj_chain_builds_inner_path() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let s = symbols.declare("s");
    let dept = symbols.declare("dept");
    let name = symbols.declare("name");

    let s_exp = b.idn(s.clone(), dummy());
    let dept_proj = b.record_proj(s_exp, dept.clone(), dummy());
    let name_proj = b.record_proj(dept_proj, name.clone(), dummy());

    let p = expr_to_path(&name_proj).unwrap();
    assert_eq!(p.root(), &s);
    assert_eq!(p.fields(), vec![dept, name]);
}

#[test]
fn non_path_shape_is_rejected() {
    let symbols = Rc::new(SymbolGenerator::new());
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), symbols.clone());
    let e = b.mk(dummy(), ExprKind::IntConst(1));

    assert!(expr_to_path(&e).is_err());
}
