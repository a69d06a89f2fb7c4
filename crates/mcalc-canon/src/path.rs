//! Path canonicalization (§4.4 "Path canonicalization"): a generator's
//! source becomes either a `VariablePath(v)` (a bound variable) or an
//! `InnerPath(p, fieldName)` (record projection chain). Malformed paths
//! are fatal (§4.4: "malformed paths are fatal") - by the time this runs,
//! every generator source must already have been reduced to a variable or
//! a chain of record projections by the rest of the canon pipeline; if one
//! hasn't, an earlier pass failed to uphold its own contract.

use mcalc_ast::{Expr, ExprKind};
use mcalc_common::{CalculusError, Symbol};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Path {
    Variable(Symbol),
    Inner(Box<Path>, Symbol),
}

impl Path {
    #[must_use]
    pub fn root(&self) -> &Symbol {
        match self {
            Path::Variable(s) => s,
            Path::Inner(p, _) => p.root(),
        }
    }

    #[must_use]
    pub fn fields(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                Path::Variable(_) => break,
                Path::Inner(p, f) => {
                    out.push(f.clone());
                    cur = p;
                }
            }
        }
        out.reverse();
        out
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Path::Variable(s) => write!(f, "{s}"),
            Path::Inner(p, field) => write!(f, "{p}.{field}"),
        }
    }
}

pub fn expr_to_path(e: &Expr) -> Result<Path, CalculusError> {
    match &e.kind {
        ExprKind::IdnExp(s) => Ok(Path::Variable(s.clone())),
        ExprKind::RecordProj(inner, field) => {
            let base = expr_to_path(inner)?;
            Ok(Path::Inner(Box::new(base), field.clone()))
        }
        _ => Err(CalculusError::InternalError {
            message: "generator source is not a well-formed path (expected a variable or a record-projection chain)".into(),
            pos: e.span,
        }),
    }
}

#[cfg(test)]
#[path = "tests/path.rs"]
mod tests;
