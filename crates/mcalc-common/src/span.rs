//! Span - source location tracking for calculus nodes and diagnostics.
//!
//! A `Span` is a `(line, column, offset)` triple rather than a byte range:
//! §6 requires every calculus node to carry `(line, column, offset)`
//! positions, and §8 invariant 8 requires algebra nodes to preserve the
//! position of the calculus node they were derived from.

use serde::{Deserialize, Serialize};

/// A single source position: line and column are 1-indexed for human
/// readability in error messages; `offset` is the 0-indexed byte offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Span {
    #[must_use]
    pub const fn new(line: u32, column: u32, offset: u32) -> Self {
        Span {
            line,
            column,
            offset,
        }
    }

    /// A synthetic span for nodes introduced by desugaring/canonicalization
    /// that have no single originating source position.
    #[must_use]
    pub const fn synthetic() -> Self {
        Span {
            line: 0,
            column: 0,
            offset: u32::MAX,
        }
    }

    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.offset == u32::MAX
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_synthetic() {
            write!(f, "<synthetic>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// A trait for tree nodes that carry a source span.
pub trait Spanned {
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}
