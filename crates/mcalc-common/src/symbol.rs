//! Symbols and the fresh-symbol generator.
//!
//! Per design note "Fresh symbols": a single monotonic counter produces
//! every fresh `Symbol` used anywhere in a compile — type variables, monoid
//! variables, attribute variables, and desugaring-introduced identifiers all
//! share it, so no two live symbols can collide.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// An interned-free, printable identifier. Two `Symbol`s are the same
/// declaration iff their `id`s are equal; `name` is only for display.
#[derive(Clone, Debug, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    id: u32,
    name: String,
}

impl Symbol {
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Per-compile monotonic symbol counter. Must be constructed fresh for each
/// compilation (§5, §9 "Global mutable state"); reusing one across compiles
/// would corrupt let-polymorphism snapshots taken against its state.
#[derive(Debug)]
pub struct SymbolGenerator {
    next: AtomicU32,
}

impl Default for SymbolGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolGenerator {
    #[must_use]
    pub fn new() -> Self {
        SymbolGenerator {
            next: AtomicU32::new(0),
        }
    }

    /// Allocate a fresh symbol with the given display prefix, e.g.
    /// `fresh("v")` -> `v$42`.
    pub fn fresh(&self, prefix: &str) -> Symbol {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Symbol {
            id,
            name: format!("{prefix}${id}"),
        }
    }

    /// Wrap a user-declared name as a `Symbol` with a guaranteed-unique id.
    /// Used when binding a named identifier that appears in the source tree
    /// rather than being synthesized by a pass.
    pub fn declare(&self, name: impl Into<String>) -> Symbol {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        Symbol {
            id,
            name: name.into(),
        }
    }

    /// Current watermark, useful for let-polymorphism snapshots (§4.2):
    /// any symbol with `id >= snapshot` was created during the bound
    /// expression's inference and is a candidate generalization variable.
    pub fn watermark(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_symbols_are_monotonic_and_unique() {
        let gen = SymbolGenerator::new();
        let a = gen.fresh("t");
        let b = gen.fresh("t");
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    #[test]
    fn watermark_captures_snapshot_point() {
        let gen = SymbolGenerator::new();
        let _ = gen.fresh("t");
        let snap = gen.watermark();
        let fresh = gen.fresh("t");
        assert!(fresh.id() >= snap);
    }
}
