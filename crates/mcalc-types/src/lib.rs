//! Types & Monoids kernel (§4.1, §3.1, §3.2): the shared algebraic data
//! model for types, monoids, and record attributes, plus the disjoint-set
//! union-find tables and unification contract every later pass builds on.

pub mod monoid;
pub mod pretty;
pub mod record;
pub mod scheme;
pub mod solver;
pub mod ty;
pub mod uf;

pub use monoid::{Monoid, MonoidGraph, MonoidProperties};
pub use record::{Attribute, ConcatDefinitions, ConcatSlot, RecordAttributes};
pub use solver::TypeSolver;
pub use ty::{NullableType, Type, TypeScheme};
pub use uf::{AttrVar, MonoidVar, TypeVar, UnionFind};
