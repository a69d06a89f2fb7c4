//! Convenience constructors for building calculus trees (used by the
//! desugarer and canonicalizer when they synthesize new nodes, and by
//! tests). Every constructor draws its [`NodeId`] from a shared
//! [`NodeIdGenerator`] so rewritten subtrees never collide with the
//! original tree's ids.

use std::rc::Rc;

use mcalc_common::{Span, Symbol, SymbolGenerator};

use crate::expr::{Expr, ExprKind, ExprNode};
use crate::node_id::NodeIdGenerator;
use crate::pattern::Pattern;

pub struct Builder {
    pub ids: Rc<NodeIdGenerator>,
    pub symbols: Rc<SymbolGenerator>,
}

impl Builder {
    #[must_use]
    pub fn new(ids: Rc<NodeIdGenerator>, symbols: Rc<SymbolGenerator>) -> Self {
        Builder { ids, symbols }
    }

    pub fn mk(&self, span: Span, kind: ExprKind) -> Expr {
        ExprNode::new(self.ids.fresh(), span, kind)
    }

    pub fn idn(&self, sym: Symbol, span: Span) -> Expr {
        self.mk(span, ExprKind::IdnExp(sym))
    }

    pub fn fresh_idn_pattern(&self, prefix: &str, span: Span) -> (Symbol, Pattern) {
        let sym = self.symbols.fresh(prefix);
        (sym.clone(), Pattern::Idn(sym, span))
    }

    pub fn bool_const(&self, b: bool, span: Span) -> Expr {
        self.mk(span, ExprKind::BoolConst(b))
    }

    pub fn record_proj(&self, inner: Expr, field: Symbol, span: Span) -> Expr {
        self.mk(span, ExprKind::RecordProj(inner, field))
    }

    pub fn binary(&self, op: crate::expr::BinaryOp, l: Expr, r: Expr, span: Span) -> Expr {
        self.mk(span, ExprKind::BinaryExp(op, l, r))
    }

    pub fn unary(&self, op: crate::expr::UnaryOp, inner: Expr, span: Span) -> Expr {
        self.mk(span, ExprKind::UnaryExp(op, inner))
    }

    pub fn comp(&self, m: mcalc_types::Monoid, qs: Vec<crate::pattern::Qualifier>, body: Expr, span: Span) -> Expr {
        self.mk(span, ExprKind::Comp(m, qs, body))
    }

    pub fn fresh_sym(&self, prefix: &str) -> Symbol {
        self.symbols.fresh(prefix)
    }
}
