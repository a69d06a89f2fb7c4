//! Centralized limits and thresholds, grounded on `tsz-common::limits`.

/// Maximum recursion depth for occurs-check / user-type-expansion traversals
/// (§9 "Cyclic type references"). A compile that exceeds this is treated as
/// hitting an unbounded cyclic expansion rather than spinning forever.
pub const MAX_TYPE_EXPANSION_DEPTH: usize = 256;

/// Maximum number of qualifiers folded into a single comprehension by the
/// hoisting rewrite (§4.4) before the normalizer gives up fusing further and
/// leaves the remainder nested; purely a safety valve against pathological
/// input, not a semantic limit.
pub const MAX_HOIST_ITERATIONS: usize = 10_000;
