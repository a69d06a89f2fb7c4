//! Entities (§3.4): what an `IdnDef`/`IdnUse` resolves to, attached as a
//! node-keyed side table by the semantic analyzer rather than stored on the
//! tree (design note: attribute-grammar attributes become side tables).

use mcalc_common::Symbol;
use mcalc_types::Type;

use crate::expr::Expr;

#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Variable(Symbol, Type),
    DataSource(Symbol),
    /// `partition` inside a group-by `Select.proj`.
    Partition(Expr, Type),
    /// `*` inside a `Select.proj`.
    Star(Expr, Type),
    /// An implicit attribute injected by the alias environment for an
    /// anonymous generator over a record collection: `(attribute name,
    /// the generator expression, its 1-based tuple index when the
    /// generator is part of a multi-generator `Select`)`.
    GenAttribute(Symbol, Expr, usize),
    /// An implicit attribute injected by `Into(e1, e2)` from `e1`'s record
    /// fields into `e2`'s scope.
    IntoAttribute(Symbol, Expr, usize),
    /// Two declarations of the same identifier in one scope (§3.4,
    /// "Shadowing rule"); reported exactly once.
    Multiple,
    Unknown,
}

impl Entity {
    #[must_use]
    pub fn ty(&self) -> Option<Type> {
        match self {
            Entity::Variable(_, t) | Entity::Partition(_, t) | Entity::Star(_, t) => Some(t.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_multiple(&self) -> bool {
        matches!(self, Entity::Multiple)
    }
}
