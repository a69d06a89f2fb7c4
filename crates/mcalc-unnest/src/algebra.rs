//! The target algebra (§4.5, §6 "Outputs"): `Scan / Select / Join /
//! OuterJoin / Unnest / OuterUnnest / Nest / Reduce`, with argument
//! expressions referencing the current row positionally via
//! `Argument(type, index)` rather than by name - the flat algebra has no
//! identifier scope of its own (§6: "argument-expressions use positional
//! `Argument(type, index)` references and primitive monoids and types
//! only").

use mcalc_ast::{BinaryOp, UnaryOp};
use mcalc_common::Span;
use mcalc_types::{Monoid, Type};

use crate::pattern::Pattern;

/// An expression in algebra position: the calculus expression language
/// with every free variable already resolved to a positional `Argument`
/// and every nested comprehension already eliminated (§4.5 "Expression and
/// path translation").
#[derive(Clone, Debug, PartialEq)]
pub enum AlgExpr {
    BoolConst(bool),
    IntConst(i64),
    FloatConst(f64),
    StringConst(String),
    /// A positional reference into the current row pattern; `index` is
    /// `patternVariables(pattern).indexOf(v)` for whichever pattern is in
    /// scope at the algebra node consuming this expression.
    Argument(Type, usize),
    RecordProj(Box<AlgExpr>, mcalc_common::Symbol),
    RecordCons(Vec<(mcalc_common::Symbol, AlgExpr)>),
    IfThenElse(Box<AlgExpr>, Box<AlgExpr>, Box<AlgExpr>),
    BinaryExp(BinaryOp, Box<AlgExpr>, Box<AlgExpr>),
    UnaryExp(UnaryOp, Box<AlgExpr>),
    MergeMonoid(Monoid, Box<AlgExpr>, Box<AlgExpr>),
    ZeroCollectionMonoid(Monoid),
    ConsCollectionMonoid(Monoid, Box<AlgExpr>),
    MultiCons(Monoid, Vec<AlgExpr>),
}

impl AlgExpr {
    #[must_use]
    pub fn bool_true() -> AlgExpr {
        AlgExpr::BoolConst(true)
    }

    #[must_use]
    pub fn is_trivially_true(&self) -> bool {
        matches!(self, AlgExpr::BoolConst(true))
    }

    pub fn and(self, other: AlgExpr) -> AlgExpr {
        if self.is_trivially_true() {
            return other;
        }
        if other.is_trivially_true() {
            return self;
        }
        AlgExpr::BinaryExp(BinaryOp::And, Box::new(self), Box::new(other))
    }
}

/// The flat relational-style algebra (§4.5, §6). `Empty` is the initial
/// "no child yet" sentinel the driver threads as `E` before any generator
/// has been consumed - it never appears in a finished tree handed back to
/// a caller (every real query has at least one generator, or reduces to a
/// single `Reduce`/`Nest` over `Empty` being a compile-time contradiction
/// caught upstream).
#[derive(Clone, Debug, PartialEq)]
pub enum AlgebraNode {
    Empty,
    Scan {
        source: String,
        elem_ty: Type,
        span: Span,
    },
    Select {
        pred: AlgExpr,
        child: Box<AlgebraNode>,
        span: Span,
    },
    Join {
        pred: AlgExpr,
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        span: Span,
    },
    OuterJoin {
        pred: AlgExpr,
        left: Box<AlgebraNode>,
        right: Box<AlgebraNode>,
        span: Span,
    },
    Unnest {
        path: AlgExpr,
        pred: AlgExpr,
        child: Box<AlgebraNode>,
        span: Span,
    },
    OuterUnnest {
        path: AlgExpr,
        pred: AlgExpr,
        child: Box<AlgebraNode>,
        span: Span,
    },
    /// `Nest(monoid, e, key, pred, g, child)` (§4.5): groups `child`'s rows
    /// by `key`, reducing each group's `e` by `monoid`; `g` names the
    /// per-group row pattern (the generator variables the group-by
    /// correlation added beyond the outer key, §4.5 rule C8
    /// `reducePattern`). `key_field`/`agg_field` are the two output record
    /// fields this node's `Collection(outer_monoid, Record(..))` result
    /// carries - not part of the literature's 6-tuple, but needed here
    /// since this algebra's `Nest` is also the terminal node of a
    /// `GROUP BY` query rather than a pure grouping primitive (see
    /// `DESIGN.md`, "Nest doubles as the outer reduce").
    Nest {
        monoid: Monoid,
        e: AlgExpr,
        key: AlgExpr,
        pred: AlgExpr,
        g: Pattern,
        child: Box<AlgebraNode>,
        outer_monoid: Monoid,
        key_field: mcalc_common::Symbol,
        agg_field: mcalc_common::Symbol,
        span: Span,
    },
    Reduce {
        monoid: Monoid,
        e: AlgExpr,
        pred: AlgExpr,
        child: Box<AlgebraNode>,
        span: Span,
    },
}

impl AlgebraNode {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            AlgebraNode::Empty => Span::synthetic(),
            AlgebraNode::Scan { span, .. }
            | AlgebraNode::Select { span, .. }
            | AlgebraNode::Join { span, .. }
            | AlgebraNode::OuterJoin { span, .. }
            | AlgebraNode::Unnest { span, .. }
            | AlgebraNode::OuterUnnest { span, .. }
            | AlgebraNode::Nest { span, .. }
            | AlgebraNode::Reduce { span, .. } => *span,
        }
    }
}
