//! The calculus expression tree (§3.3).
//!
//! Nodes are reference-counted and immutable once built (§3.5): a pass that
//! rewrites the tree allocates new nodes rather than mutating existing ones,
//! and a fresh [`NodeId`] per rewritten node keeps every pass's side tables
//! (entities, types, environments) keyed unambiguously to the tree that
//! pass actually saw.

use std::rc::Rc;

use mcalc_common::{Span, Symbol};
use mcalc_types::Monoid;

use crate::node_id::NodeId;
use crate::pattern::{Pattern, Qualifier};

pub type Expr = Rc<ExprNode>;

#[derive(Clone, Debug, PartialEq)]
pub struct ExprNode {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    /// Explicit `set -> bag` conversion inserted by the `Sum`/`Count`/...
    /// desugarings so duplicate-insensitive sources are re-counted with
    /// duplicates (§4.3 "Sugar operators").
    ToBag,
    ToList,
}

/// One field of a `RecordCons` literal.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    pub idn: Symbol,
    pub value: Expr,
}

/// `ORDER BY` key with direction.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderKey {
    pub expr: Expr,
    pub ascending: bool,
}

/// `Select(from, distinct, groupBy, proj, where, orderBy, having)` (§3.3).
#[derive(Clone, Debug, PartialEq)]
pub struct Select {
    /// Generators only; `Bind`/predicate qualifiers the surface syntax
    /// attaches to `FROM` are represented via `where_`.
    pub from: Vec<Qualifier>,
    pub distinct: bool,
    pub group_by: Option<Expr>,
    pub proj: Expr,
    pub where_: Option<Expr>,
    pub order_by: Vec<OrderKey>,
    pub having: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    BoolConst(bool),
    IntConst(i64),
    FloatConst(f64),
    StringConst(String),

    IdnExp(Symbol),
    RecordProj(Expr, Symbol),
    RecordCons(Vec<RecordField>),
    IfThenElse(Expr, Expr, Expr),
    BinaryExp(BinaryOp, Expr, Expr),
    UnaryExp(UnaryOp, Expr),

    /// Combines two values of the same monoid (e.g. set union, sum +).
    MergeMonoid(Monoid, Expr, Expr),
    /// The identity/empty value of a collection monoid.
    ZeroCollectionMonoid(Monoid),
    /// A one-element collection under the given monoid.
    ConsCollectionMonoid(Monoid, Expr),
    /// A collection literal of several elements, e.g. `set(1, 2, 3)`.
    MultiCons(Monoid, Vec<Expr>),

    /// `for (qs) yield m e`.
    Comp(Monoid, Vec<Qualifier>, Expr),

    Select(Box<Select>),

    FunAbs(Pattern, Expr),
    FunApp(Expr, Expr),

    /// `ExpBlock(binds, e)`: a sequence of `let`-binds scoping a final
    /// expression, desugared away before canonicalization (§4.3).
    ExpBlock(Vec<(Pattern, Expr)>, Expr),

    /// Reference to the enclosing `Select`'s group (only valid in
    /// `Select.proj` when `group_by` is set, §3.4 `PartitionEntity`).
    Partition,
    /// `*` in a `Select.proj` (§3.4 `StarEntity`).
    Star,
    /// `Into(e1, e2)`: injects `e1`'s record fields into `e2`'s scope
    /// (§3.4 alias environment).
    Into(Expr, Expr),

    // -- sugar operators (§4.3), eliminated by the desugarer --
    Sum(Expr),
    Max(Expr),
    Min(Expr),
    Avg(Expr),
    Count(Expr),
    Exists(Expr),
    InExp(Expr, Expr),
}

impl ExprNode {
    #[must_use]
    pub fn new(id: NodeId, span: Span, kind: ExprKind) -> Expr {
        Rc::new(ExprNode { id, span, kind })
    }
}

impl mcalc_common::Spanned for ExprNode {
    fn span(&self) -> Span {
        self.span
    }
}
