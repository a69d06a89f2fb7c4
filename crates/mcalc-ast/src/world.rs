//! `World` — the read-only catalog input (§3.5, §6 "Inputs"): a map from
//! data-source names to their element types, plus a map of user-defined
//! type definitions.

use mcalc_common::Symbol;
use mcalc_types::Type;
use rustc_hash::FxHashMap;

/// Shared, read-only across a compilation (§5 "Shared resource policy").
/// `sources` gives each catalog name an element type — a generator `s <-
/// students` draws from `Collection(m, sources["students"])` for whatever
/// monoid the source's physical representation implies; `tipes` resolves
/// `UserType` references.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub sources: FxHashMap<String, Type>,
    pub tipes: FxHashMap<Symbol, Type>,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.sources.insert(name.into(), ty);
        self
    }

    pub fn with_user_type(mut self, sym: Symbol, ty: Type) -> Self {
        self.tipes.insert(sym, ty);
        self
    }

    #[must_use]
    pub fn source(&self, name: &str) -> Option<&Type> {
        self.sources.get(name)
    }
}
