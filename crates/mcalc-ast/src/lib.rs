//! The calculus AST (§3.3, §3.4): the IR node set, patterns, entities, and
//! the `World` catalog input that every later pass consumes and rewrites.

pub mod builder;
pub mod entity;
pub mod expr;
pub mod node_id;
pub mod pattern;
pub mod pretty;
pub mod rewrite;
pub mod world;

pub use builder::Builder;
pub use entity::Entity;
pub use expr::{BinaryOp, Expr, ExprKind, ExprNode, OrderKey, RecordField, Select, UnaryOp};
pub use node_id::{NodeId, NodeIdGenerator};
pub use pattern::{Pattern, Qualifier};
pub use rewrite::{free_idns, map_children, replace_by_id, substitute_idn, walk};
pub use world::World;

#[cfg(test)]
#[path = "tests/pretty.rs"]
mod tests;
