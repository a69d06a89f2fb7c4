//! The semantic analyzer (§4.2): scope/environment chains, entity
//! resolution, Hindley-Milner type inference extended with row polymorphism,
//! monoid subtyping, and let-polymorphism; plus the nullability post-pass.

pub mod analyzer;
pub mod env;
pub mod nullability;
pub mod select_type;

pub use analyzer::{analyze, AnalysisResult, Analyzer};

#[cfg(test)]
#[path = "tests/analyzer.rs"]
mod tests;
