use std::rc::Rc;

use mcalc_common::{Span, SymbolGenerator};

use crate::builder::Builder;
use crate::expr::ExprKind;
use crate::node_id::NodeIdGenerator;
use crate::pattern::{Pattern, Qualifier};
use crate::pretty::format_expr;

fn dummy() -> Span {
    Span::synthetic()
}

#[test]
fn renders_simple_filter_comprehension() {
    let b = Builder::new(Rc::new(NodeIdGenerator::new()), Rc::new(SymbolGenerator::new()));
    let s = b.symbols.declare("s");
    let students = b.idn(b.symbols.declare("students"), dummy());
    let gen = Qualifier::Gen(Some(Pattern::Idn(s.clone(), dummy())), students);
    let age = b.mk(
        dummy(),
        ExprKind::RecordProj(b.idn(s.clone(), dummy()), b.symbols.declare("age")),
    );
    let pred = b.mk(
        dummy(),
        ExprKind::BinaryExp(crate::expr::BinaryOp::Gt, age, b.mk(dummy(), ExprKind::IntConst(20))),
    );
    let yield_e = b.idn(s, dummy());
    let comp = b.mk(
        dummy(),
        ExprKind::Comp(
            mcalc_types::Monoid::Set,
            vec![gen, Qualifier::Exp(pred)],
            yield_e,
        ),
    );
    let rendered = format_expr(&comp);
    assert!(rendered.starts_with("for ("));
    assert!(rendered.contains("yield set"));
}
