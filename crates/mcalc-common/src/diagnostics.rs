//! Structured, wire-stable compiler errors (§6 "Error kinds", §7).
//!
//! `CalculusError` is the sum type every pass accumulates into instead of
//! aborting (§7 "Propagation policy"). Each variant is one of the wire-stable
//! kinds from §6; the variant itself is the "code", and `message` is the
//! human-readable description. Up to two source positions are attached,
//! matching "each carrying a kind, a human-readable description, and up to
//! two source positions".

use crate::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Message,
}

/// One of the wire-stable error kinds from §6. Kept as a plain enum (not a
/// trait object) so a downstream caller can match exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculusError {
    IncompatibleTypes {
        message: String,
        pos1: Span,
        pos2: Span,
    },
    UnexpectedType {
        message: String,
        pos: Span,
    },
    IncompatibleMonoids {
        message: String,
        pos: Span,
    },
    PatternMismatch {
        message: String,
        pos: Span,
    },
    MultipleDecl {
        idn: String,
        pos1: Span,
        pos2: Span,
    },
    UnknownDecl {
        idn: String,
        pos: Span,
    },
    AmbiguousIdn {
        idn: String,
        pos: Span,
    },
    UnknownPartition {
        pos: Span,
    },
    UnknownStar {
        pos: Span,
    },
    IllegalStar {
        pos: Span,
    },
    InvalidRegexSyntax {
        message: String,
        pos: Span,
    },
    InvalidDateTimeFormatSyntax {
        message: String,
        pos: Span,
    },
    /// A later pass found the canonical-form invariants violated. This is a
    /// bug in an earlier pass, not a user error (§4.5 "Failure semantics",
    /// §7 "Internal invariants").
    InternalError {
        message: String,
        pos: Span,
    },
}

impl CalculusError {
    #[must_use]
    pub fn category(&self) -> DiagnosticCategory {
        DiagnosticCategory::Error
    }

    /// The primary source position for this error, used by callers that
    /// only want one location (e.g. sorting diagnostics for display).
    #[must_use]
    pub fn primary_span(&self) -> Span {
        use CalculusError::*;
        match self {
            IncompatibleTypes { pos1, .. } => *pos1,
            MultipleDecl { pos1, .. } => *pos1,
            UnexpectedType { pos, .. }
            | IncompatibleMonoids { pos, .. }
            | PatternMismatch { pos, .. }
            | UnknownDecl { pos, .. }
            | AmbiguousIdn { pos, .. }
            | UnknownPartition { pos }
            | UnknownStar { pos }
            | IllegalStar { pos }
            | InvalidRegexSyntax { pos, .. }
            | InvalidDateTimeFormatSyntax { pos, .. }
            | InternalError { pos, .. } => *pos,
        }
    }

    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, CalculusError::InternalError { .. })
    }
}

impl std::fmt::Display for CalculusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CalculusError::*;
        match self {
            IncompatibleTypes { message, pos1, pos2 } => {
                write!(f, "{pos1}: incompatible types: {message} (also see {pos2})")
            }
            UnexpectedType { message, pos } => write!(f, "{pos}: unexpected type: {message}"),
            IncompatibleMonoids { message, pos } => {
                write!(f, "{pos}: incompatible monoids: {message}")
            }
            PatternMismatch { message, pos } => write!(f, "{pos}: pattern mismatch: {message}"),
            MultipleDecl { idn, pos1, pos2 } => {
                write!(f, "{pos1}: `{idn}` is declared more than once (also see {pos2})")
            }
            UnknownDecl { idn, pos } => write!(f, "{pos}: unknown declaration `{idn}`"),
            AmbiguousIdn { idn, pos } => write!(f, "{pos}: ambiguous identifier `{idn}`"),
            UnknownPartition { pos } => write!(f, "{pos}: `partition` used outside a group-by select"),
            UnknownStar { pos } => write!(f, "{pos}: `*` used outside a select projection"),
            IllegalStar { pos } => write!(f, "{pos}: `*` combined with other projections without group-by"),
            InvalidRegexSyntax { message, pos } => write!(f, "{pos}: invalid regex syntax: {message}"),
            InvalidDateTimeFormatSyntax { message, pos } => {
                write!(f, "{pos}: invalid datetime format syntax: {message}")
            }
            InternalError { message, pos } => write!(f, "{pos}: internal error (compiler bug): {message}"),
        }
    }
}

impl std::error::Error for CalculusError {}

/// Accumulator for the "accumulate rather than abort" propagation policy
/// (§7). Grounded on the teacher's `CheckerState` pattern of a `Vec` of
/// diagnostics built up across an entire pass.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<CalculusError>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CalculusError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<CalculusError> {
        self.errors
    }

    #[must_use]
    pub fn as_slice(&self) -> &[CalculusError] {
        &self.errors
    }
}
