//! Monoids (§3.2): the flat set of primitive/collection monoids, their
//! algebraic properties, and the monoid graph of ≤/≥ bounds over
//! `MonoidVariable`s.

use mcalc_common::Symbol;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// A monoid tag. Primitive monoids combine scalar values (`Sum`, `And`, ...);
/// collection monoids describe the deduplication/ordering discipline of a
/// `Collection` type; `MonoidVariable` stands for a not-yet-determined
/// collection monoid, resolved by the monoid graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Monoid {
    Sum,
    Multiply,
    Max,
    Min,
    And,
    Or,
    Set,
    Bag,
    List,
    Variable(Symbol),
}

impl Monoid {
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Monoid::Set | Monoid::Bag | Monoid::List | Monoid::Variable(_))
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Monoid::Sum | Monoid::Multiply | Monoid::Max | Monoid::Min | Monoid::And | Monoid::Or
        )
    }

    /// Known (commutative, idempotent) properties; `None` for `Variable`,
    /// whose properties are instead derived from the monoid graph bounds.
    #[must_use]
    pub fn properties(&self) -> Option<MonoidProperties> {
        use Monoid::*;
        Some(match self {
            Sum | Multiply => MonoidProperties::new(true, false),
            Max | Min | And | Or => MonoidProperties::new(true, true),
            Set => MonoidProperties::new(true, true),
            Bag => MonoidProperties::new(true, false),
            List => MonoidProperties::new(false, false),
            Variable(_) => return None,
        })
    }
}

impl std::fmt::Display for Monoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Monoid::*;
        match self {
            Sum => write!(f, "sum"),
            Multiply => write!(f, "multiply"),
            Max => write!(f, "max"),
            Min => write!(f, "min"),
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Set => write!(f, "set"),
            Bag => write!(f, "bag"),
            List => write!(f, "list"),
            Variable(s) => write!(f, "{s}"),
        }
    }
}

/// `(commutative, idempotent)` pair, ordered by "more permissive" = more
/// true: `List = (false, false) < Bag = (true, false) < Set = (true, true)`
/// on each axis independently (it is a product order, not total: e.g.
/// no known monoid has `(false, true)`, but the lattice still supports it
/// as an unreachable upper bound for a variable that accumulated
/// contradictory constraints).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonoidProperties {
    pub commutative: bool,
    pub idempotent: bool,
}

impl MonoidProperties {
    #[must_use]
    pub const fn new(commutative: bool, idempotent: bool) -> Self {
        MonoidProperties {
            commutative,
            idempotent,
        }
    }

    /// Is `self` permitted given the variable's current lower bound `min`
    /// and upper bound `max`? i.e. does `min <= self <= max` hold
    /// independently on each axis (`false < true`).
    #[must_use]
    pub fn within(&self, min: MonoidProperties, max: MonoidProperties) -> bool {
        (!min.commutative || self.commutative)
            && (!min.idempotent || self.idempotent)
            && (!self.commutative || max.commutative)
            && (!self.idempotent || max.idempotent)
    }
}

/// Which of the three known *collection* monoids a property pair matches,
/// if any (used when narrowing a variable to a concrete monoid).
#[must_use]
pub fn collection_monoid_for(props: MonoidProperties) -> Option<Monoid> {
    match (props.commutative, props.idempotent) {
        (true, true) => Some(Monoid::Set),
        (true, false) => Some(Monoid::Bag),
        (false, false) => Some(Monoid::List),
        (false, true) => None,
    }
}

/// The monoid graph: for each `MonoidVariable` symbol, the sets of monoids
/// that are known lower bounds (`leq_monoids`, i.e. "this variable must be
/// at least as permissive as these") and upper bounds (`geq_monoids`, i.e.
/// "this variable must be at most as permissive as these") in the partial
/// order induced by `(commutative, idempotent)` (§3.2).
#[derive(Debug, Default, Clone)]
pub struct MonoidGraph {
    leq: FxHashMap<Symbol, BTreeSet<ResolvedMonoid>>,
    geq: FxHashMap<Symbol, BTreeSet<ResolvedMonoid>>,
}

/// A monoid that participates in graph bounds, ordered for `BTreeSet` by its
/// properties so `min`/`max` below are well-defined.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedMonoid {
    pub props: MonoidProperties,
    pub label: &'static str,
}

impl MonoidGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lower_bound(&mut self, var: Symbol, m: ResolvedMonoid) {
        self.leq.entry(var).or_default().insert(m);
    }

    pub fn add_upper_bound(&mut self, var: Symbol, m: ResolvedMonoid) {
        self.geq.entry(var).or_default().insert(m);
    }

    /// The meet of the lower bounds' maxima (the strongest lower requirement
    /// derivable so far) and the join of the upper bounds' minima, per
    /// §3.2's invariant. Returns `None` bounds when the variable has no
    /// constraints yet (anything is allowed).
    #[must_use]
    pub fn bounds(&self, var: &Symbol) -> (MonoidProperties, MonoidProperties) {
        let min = self
            .leq
            .get(var)
            .into_iter()
            .flatten()
            .map(|m| m.props)
            .fold(MonoidProperties::new(false, false), |acc, p| {
                MonoidProperties::new(acc.commutative || p.commutative, acc.idempotent || p.idempotent)
            });
        let max = self
            .geq
            .get(var)
            .into_iter()
            .flatten()
            .map(|m| m.props)
            .fold(MonoidProperties::new(true, true), |acc, p| {
                MonoidProperties::new(acc.commutative && p.commutative, acc.idempotent && p.idempotent)
            });
        (min, max)
    }

    /// It is a type error if a variable's lower bound exceeds its upper
    /// bound on either axis (§3.2 invariant).
    #[must_use]
    pub fn is_satisfiable(&self, var: &Symbol) -> bool {
        let (min, max) = self.bounds(var);
        (!min.commutative || max.commutative) && (!min.idempotent || max.idempotent)
    }

    /// Merge the bound sets of `into` and `from` (used when two monoid
    /// variables are unified) and drop `from`'s entries.
    pub fn merge(&mut self, into: &Symbol, from: &Symbol) {
        if let Some(set) = self.leq.remove(from) {
            self.leq.entry(into.clone()).or_default().extend(set);
        }
        if let Some(set) = self.geq.remove(from) {
            self.geq.entry(into.clone()).or_default().extend(set);
        }
    }
}

pub const SET_BOUND: ResolvedMonoid = ResolvedMonoid {
    props: MonoidProperties::new(true, true),
    label: "set",
};
pub const BAG_BOUND: ResolvedMonoid = ResolvedMonoid {
    props: MonoidProperties::new(true, false),
    label: "bag",
};
pub const LIST_BOUND: ResolvedMonoid = ResolvedMonoid {
    props: MonoidProperties::new(false, false),
    label: "list",
};

#[must_use]
pub fn bound_for(m: &Monoid) -> Option<ResolvedMonoid> {
    match m {
        Monoid::Set => Some(SET_BOUND),
        Monoid::Bag => Some(BAG_BOUND),
        Monoid::List => Some(LIST_BOUND),
        Monoid::Variable(_) => None,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_most_restrictive_collection_monoid() {
        let set = Monoid::Set.properties().unwrap();
        let bag = Monoid::Bag.properties().unwrap();
        let list = Monoid::List.properties().unwrap();
        assert_eq!(collection_monoid_for(set), Some(Monoid::Set));
        assert_eq!(collection_monoid_for(bag), Some(Monoid::Bag));
        assert_eq!(collection_monoid_for(list), Some(Monoid::List));
    }

    #[test]
    fn unsatisfiable_when_lower_bound_exceeds_upper_bound() {
        let mut graph = MonoidGraph::new();
        let gen = mcalc_common::SymbolGenerator::new();
        let v = gen.fresh("m");
        // Lower bound requires idempotent, upper bound forbids it: unsatisfiable on that axis.
        graph.add_lower_bound(v.clone(), ResolvedMonoid {
            props: MonoidProperties::new(false, true),
            label: "pseudo-lower",
        });
        graph.add_upper_bound(v.clone(), ResolvedMonoid {
            props: MonoidProperties::new(true, false),
            label: "pseudo-upper",
        });
        assert!(!graph.is_satisfiable(&v));
    }
}
