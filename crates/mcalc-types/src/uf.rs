//! Disjoint-set forests for types, record attributes, and monoids (§4.1,
//! design note "From union-find via object identity to disjoint-set
//! forests"). Built on `ena::unify`, the same crate `tsz-solver` depends on
//! for its type-variable table.
//!
//! Three independent tables are kept (`TypesVarMap`, `RecAttsVarMap`, and
//! the monoid variable table used by [`crate::monoid::MonoidGraph`]), per
//! §2 item 1 "Two disjoint-set maps". Each is reset per-compilation (§3.5).

use ena::unify::{EqUnifyValue, InPlaceUnificationTable, UnifyKey};
use mcalc_common::Symbol;
use rustc_hash::FxHashMap;

use crate::record::RecordAttributes;
use crate::ty::Type;

/// Key into the type-variable union-find table. Indices are dense and
/// allocated in order of first use; the `Symbol` a `TypeVariable` carries is
/// only for display, `TypeVar` is the actual union-find handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeVar(u32);

impl UnifyKey for TypeVar {
    type Value = Option<Type>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TypeVar(u)
    }

    fn tag() -> &'static str {
        "TypeVar"
    }
}

impl EqUnifyValue for Type {}

/// Key into the record-attribute union-find table (`AttributesVariable` /
/// `ConcatAttributes` symbols resolve through here).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrVar(u32);

impl UnifyKey for AttrVar {
    type Value = Option<RecordAttributes>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        AttrVar(u)
    }

    fn tag() -> &'static str {
        "AttrVar"
    }
}

impl EqUnifyValue for RecordAttributes {}

/// Key into the monoid-variable union-find table. Values live in
/// [`crate::monoid::MonoidGraph`] rather than in the table itself, since a
/// monoid variable's "value" is a pair of bound sets, not a single
/// settled monoid, until it is finally narrowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonoidVar(u32);

impl UnifyKey for MonoidVar {
    type Value = Option<crate::monoid::Monoid>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        MonoidVar(u)
    }

    fn tag() -> &'static str {
        "MonoidVar"
    }
}

impl EqUnifyValue for crate::monoid::Monoid {}

/// The three disjoint-set forests owned by one compilation (§3.5: "owned by
/// the semantic analyzer of the current compile; they do not cross compile
/// boundaries").
#[derive(Default)]
pub struct UnionFind {
    pub types: InPlaceUnificationTable<TypeVar>,
    pub atts: InPlaceUnificationTable<AttrVar>,
    pub monoids: InPlaceUnificationTable<MonoidVar>,

    /// `Symbol` is the name a `TypeVariable`/`AttributesVariable`/
    /// `MonoidVariable` carries in the AST; these maps give each symbol a
    /// dense union-find key the first time it is seen, so repeated
    /// `TypeVariable(s)` occurrences of the same `s` resolve to the same
    /// class.
    type_syms: FxHashMap<Symbol, TypeVar>,
    attr_syms: FxHashMap<Symbol, AttrVar>,
    monoid_syms: FxHashMap<Symbol, MonoidVar>,
}

impl UnionFind {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_type_var(&mut self) -> TypeVar {
        self.types.new_key(None)
    }

    pub fn new_attr_var(&mut self) -> AttrVar {
        self.atts.new_key(None)
    }

    pub fn new_monoid_var(&mut self) -> MonoidVar {
        self.monoids.new_key(None)
    }

    pub fn type_var_for_symbol(&mut self, sym: &Symbol) -> TypeVar {
        if let Some(v) = self.type_syms.get(sym) {
            return *v;
        }
        let v = self.new_type_var();
        self.type_syms.insert(sym.clone(), v);
        v
    }

    pub fn attr_var_for_symbol(&mut self, sym: &Symbol) -> AttrVar {
        if let Some(v) = self.attr_syms.get(sym) {
            return *v;
        }
        let v = self.new_attr_var();
        self.attr_syms.insert(sym.clone(), v);
        v
    }

    pub fn monoid_var_for_symbol(&mut self, sym: &Symbol) -> MonoidVar {
        if let Some(v) = self.monoid_syms.get(sym) {
            return *v;
        }
        let v = self.new_monoid_var();
        self.monoid_syms.insert(sym.clone(), v);
        v
    }
}
