//! Unnester patterns (§4.5 "State"): `EmptyPattern`, `VariablePattern(v)`,
//! `PairPattern(a, b)`. Distinct from [`mcalc_ast::Pattern`] (the surface
//! product pattern a `FunAbs`/generator destructures) - this pattern
//! instead tracks which *algebra rows* are in scope at a point in the
//! driver's recursion, purely so `Argument(type, index)` references can be
//! computed by position.

use mcalc_common::Symbol;
use mcalc_types::Type;

#[derive(Clone, Debug, PartialEq)]
pub enum Pattern {
    Empty,
    Variable(Symbol, Type),
    Pair(Box<Pattern>, Box<Pattern>),
}

impl Pattern {
    #[must_use]
    pub fn pair(a: Pattern, b: Pattern) -> Pattern {
        match (&a, &b) {
            (Pattern::Empty, _) => b,
            (_, Pattern::Empty) => a,
            _ => Pattern::Pair(Box::new(a), Box::new(b)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Pattern::Empty)
    }

    /// `patternVariables(p)`: the de-duplicated, left-to-right sequence of
    /// `(Symbol, Type)` this pattern binds, used to compute `Argument`
    /// indices (§4.5 "State").
    #[must_use]
    pub fn pattern_variables(&self) -> Vec<(Symbol, Type)> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<(Symbol, Type)>) {
        match self {
            Pattern::Empty => {}
            Pattern::Variable(s, t) => {
                if !out.iter().any(|(o, _)| o.id() == s.id()) {
                    out.push((s.clone(), t.clone()));
                }
            }
            Pattern::Pair(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
        }
    }

    /// The 0-based slot of `sym` within [`Self::pattern_variables`], if
    /// bound by this pattern at all.
    #[must_use]
    pub fn index_of(&self, sym: &Symbol) -> Option<usize> {
        self.pattern_variables().iter().position(|(s, _)| s.id() == sym.id())
    }

    #[must_use]
    pub fn binds(&self, sym: &Symbol) -> bool {
        self.index_of(sym).is_some()
    }
}

/// `reducePattern(l, r)` (§4.5 rule C8): strip from `l` the variables that
/// already appear in `r`, used to compute a `Nest`'s `g` (the variables
/// the nested generators added beyond the outer pattern already covered by
/// `key`).
#[must_use]
pub fn reduce_pattern(l: &Pattern, r: &Pattern) -> Pattern {
    let r_vars = r.pattern_variables();
    prune(l, &r_vars)
}

fn prune(p: &Pattern, remove: &[(Symbol, Type)]) -> Pattern {
    match p {
        Pattern::Empty => Pattern::Empty,
        Pattern::Variable(s, _) if remove.iter().any(|(r, _)| r.id() == s.id()) => Pattern::Empty,
        Pattern::Variable(..) => p.clone(),
        Pattern::Pair(a, b) => Pattern::pair(prune(a, remove), prune(b, remove)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcalc_common::SymbolGenerator;

    #[test]
    fn pattern_variables_are_left_to_right_and_deduped() {
        let gen = SymbolGenerator::new();
        let s = gen.declare("s");
        let p = Pattern::pair(
            Pattern::Variable(s.clone(), Type::Int),
            Pattern::Variable(s.clone(), Type::Int),
        );
        assert_eq!(p.pattern_variables().len(), 1);
    }

    #[test]
    fn reduce_pattern_strips_outer_variables() {
        let gen = SymbolGenerator::new();
        let s = gen.declare("s");
        let s2 = gen.declare("s2");
        let w = Pattern::pair(
            Pattern::Variable(s.clone(), Type::Int),
            Pattern::Variable(s2.clone(), Type::Int),
        );
        let u = Pattern::Variable(s, Type::Int);
        let g = reduce_pattern(&w, &u);
        assert_eq!(g.pattern_variables(), vec![(s2, Type::Int)]);
    }
}
