//! `CompileOptions` (§10.3 "Configuration"): the only knob a compile takes
//! beyond `(Tree, World)`. The core has nothing else to externalize - it
//! is a pure function of its three inputs (§5) - so there is no
//! file-based configuration layer, only this struct.

/// Grounded on `tsz-common::limits`: a small, explicit options struct
/// rather than a loaded config file, since every other pass parameter is
/// either fixed by the spec or derived entirely from the input tree and
/// catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Recursion ceiling for the occurs-check/cyclic-user-type expansion
    /// traversal (§9 "Cyclic type references"). Defaults to
    /// [`mcalc_common::limits::MAX_TYPE_EXPANSION_DEPTH`].
    pub max_unification_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            max_unification_depth: mcalc_common::limits::MAX_TYPE_EXPANSION_DEPTH,
        }
    }
}

impl CompileOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_unification_depth(mut self, depth: usize) -> Self {
        self.max_unification_depth = depth;
        self
    }
}
