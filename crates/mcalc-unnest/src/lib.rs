//! The unnester (§4.5): the final pipeline stage (§2 item 6), rewriting one
//! canonical comprehension into the flat `Scan/Select/Join/OuterJoin/
//! Unnest/OuterUnnest/Nest/Reduce` algebra via the term-rewriting driver
//! `T(e, u, w, E)`.
//!
//! Module layout mirrors the other passes: [`pattern`] is the driver's own
//! state (distinct from [`mcalc_ast::Pattern`]), [`algebra`] is the target
//! IR, [`translate`] turns calculus expressions into algebra expressions,
//! [`split`] implements predicate splitting, and [`driver`] is `T` itself.

mod algebra;
mod driver;
mod pattern;
mod split;
mod translate;

pub use algebra::{AlgExpr, AlgebraNode};
pub use pattern::{reduce_pattern, Pattern};

use mcalc_ast::Expr;
use mcalc_common::{CalculusError, Symbol};
use mcalc_types::Type;

/// Threaded through the driver: the completed canonicalizer context (for
/// `decompose_canonical_comp`, node types, and fresh symbols/nodes needed
/// when hoisting introduces a variable) plus nothing of its own - this
/// crate never synthesizes new calculus-tree structure beyond what hoisting
/// requires, so it borrows `mcalc-canon`'s builder rather than keeping a
/// second one.
pub struct UnnestCtx {
    pub canon: mcalc_canon::CanonCtx,
}

impl UnnestCtx {
    #[must_use]
    pub fn new(canon: mcalc_canon::CanonCtx) -> Self {
        UnnestCtx { canon }
    }

    #[must_use]
    pub fn type_of(&self, e: &Expr) -> Type {
        self.canon.type_of(e)
    }

    #[must_use]
    pub fn fresh_symbol(&self, prefix: &str) -> Symbol {
        self.canon.symbols.fresh(prefix)
    }
}

/// Top-level entry point (§2 item 6, §4.5 "Invocation: `T(root, Empty,
/// Empty, Empty)`"): unnests one canonical comprehension into a flat
/// algebra tree.
pub fn unnest(root: &Expr, ctx: &mut UnnestCtx) -> Result<AlgebraNode, CalculusError> {
    tracing::debug!("unnest: driving comprehension at {:?}", root.span);
    driver::unnest(root, ctx)
}
