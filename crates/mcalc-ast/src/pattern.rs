//! Patterns and comprehension qualifiers (§3.3).

use mcalc_common::{Span, Symbol};

use crate::expr::Expr;

/// `PatternIdn(idn)` or `PatternProd(seq)` (§3.3).
#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Idn(Symbol, Span),
    Prod(Vec<Pattern>, Span),
}

impl Pattern {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Pattern::Idn(_, s) | Pattern::Prod(_, s) => *s,
        }
    }

    /// All identifiers bound by this pattern, in left-to-right order
    /// (used when expanding `PatternProd` into per-field binds, §4.3).
    pub fn bound_idns(&self, out: &mut Vec<Symbol>) {
        match self {
            Pattern::Idn(s, _) => out.push(s.clone()),
            Pattern::Prod(items, _) => {
                for p in items {
                    p.bound_idns(out);
                }
            }
        }
    }
}

/// A qualifier in a `Comp`'s qualifier list: a generator, a bind, or a
/// boolean predicate expression (§3.3).
#[derive(Clone, Debug, PartialEq)]
pub enum Qualifier {
    /// `Gen(optional pattern, e)` — `pattern = None` means an anonymous
    /// generator (§4.3 "Anonymous generators").
    Gen(Option<Pattern>, Expr),
    Bind(Pattern, Expr),
    Exp(Expr),
}

impl Qualifier {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Qualifier::Gen(_, e) => e.span,
            Qualifier::Bind(p, _) => p.span(),
            Qualifier::Exp(e) => e.span,
        }
    }
}
