//! The `TypeSolver`: owns the three union-find tables, the monoid graph,
//! and the concat-attribute definition table for one compilation (§3.5,
//! §4.1). This is the `unify` / `walk` / `find` contract's home.

use std::rc::Rc;

use ena::unify::UnifyKey;
use mcalc_common::{CalculusError, Span, Symbol, SymbolGenerator};
use rustc_hash::FxHashMap;

use crate::monoid::{bound_for, collection_monoid_for, Monoid, MonoidGraph};
use crate::record::{Attribute, ConcatDefinitions, ConcatSlot, RecordAttributes};
use crate::ty::Type;
use crate::uf::{AttrVar, MonoidVar, TypeVar, UnionFind};

pub struct TypeSolver {
    pub uf: UnionFind,
    pub monoid_graph: MonoidGraph,
    pub concat_defs: ConcatDefinitions,
    pub symbols: Rc<SymbolGenerator>,
    /// The catalog's user-defined type map (`World.tipes`), read-only for
    /// the lifetime of the compile (§3.5).
    pub user_types: FxHashMap<Symbol, Type>,
    /// Occurs-check set of already-visited `UserType` symbols, used to stop
    /// recursive expansion at a revisit rather than looping forever (§9
    /// "Cyclic type references").
    expanding: std::cell::RefCell<Vec<Symbol>>,
    /// Recursion ceiling for [`Self::expand_user_type`], defaulting to
    /// [`mcalc_common::limits::MAX_TYPE_EXPANSION_DEPTH`]; overridable per
    /// compile via `CompileOptions::max_unification_depth`.
    max_expansion_depth: usize,
}

impl TypeSolver {
    #[must_use]
    pub fn new(symbols: Rc<SymbolGenerator>, user_types: FxHashMap<Symbol, Type>) -> Self {
        TypeSolver {
            uf: UnionFind::new(),
            monoid_graph: MonoidGraph::new(),
            concat_defs: ConcatDefinitions::new(),
            symbols,
            user_types,
            expanding: std::cell::RefCell::new(Vec::new()),
            max_expansion_depth: mcalc_common::limits::MAX_TYPE_EXPANSION_DEPTH,
        }
    }

    pub fn set_max_expansion_depth(&mut self, depth: usize) {
        self.max_expansion_depth = depth;
    }

    pub fn fresh_type_var(&mut self) -> Type {
        let sym = self.symbols.fresh("t");
        let var = self.uf.type_var_for_symbol(&sym);
        debug_assert_eq!(self.uf.types.find(var).index(), var.index());
        Type::TypeVariable(sym)
    }

    pub fn fresh_monoid_var(&mut self) -> Monoid {
        let sym = self.symbols.fresh("m");
        let _ = self.uf.monoid_var_for_symbol(&sym);
        Monoid::Variable(sym)
    }

    pub fn fresh_attr_var(&mut self, known: Vec<Attribute>) -> RecordAttributes {
        let sym = self.symbols.fresh("r");
        let _ = self.uf.attr_var_for_symbol(&sym);
        RecordAttributes::AttributesVariable(known, sym)
    }

    // -- find ----------------------------------------------------------

    pub fn find_type_sym(&mut self, sym: &Symbol) -> Symbol {
        let var = self.uf.type_var_for_symbol(sym);
        let root = self.uf.types.find(var);
        self.symbol_for_type_var(root, sym)
    }

    pub fn find_monoid_sym(&mut self, sym: &Symbol) -> Symbol {
        let var = self.uf.monoid_var_for_symbol(sym);
        let root = self.uf.monoids.find(var);
        // Monoid variables keep their original declared symbol as their
        // display name; only the equivalence class (root index) matters
        // for identity.
        let _ = root;
        sym.clone()
    }

    fn symbol_for_type_var(&self, _root: TypeVar, original: &Symbol) -> Symbol {
        // Symbols are display-only; identity is carried by the union-find
        // root, so we keep the caller's symbol for human-readable output.
        original.clone()
    }

    // -- walk ------------------------------------------------------------

    /// Reconstruct `ty` by replacing every variable with its current best
    /// representative, preferring (in order) a user type, then any
    /// non-variable type, then a non-`TypeVariable` variable, else the
    /// union-find root itself (§4.1).
    pub fn walk(&mut self, ty: &Type) -> Type {
        match ty {
            Type::TypeVariable(sym) => {
                let var = self.uf.type_var_for_symbol(sym);
                match self.uf.types.probe_value(var) {
                    Some(bound) => self.walk(&bound),
                    None => Type::TypeVariable(self.representative_symbol(var, sym)),
                }
            }
            Type::NumberType(sym) | Type::PrimitiveType(sym) => {
                let var = self.uf.type_var_for_symbol(sym);
                match self.uf.types.probe_value(var) {
                    Some(bound) => self.walk(&bound),
                    None => ty.clone(),
                }
            }
            Type::Collection(m, inner) => {
                let m2 = self.walk_monoid(m);
                Type::Collection(m2, Rc::new(self.walk(inner)))
            }
            Type::Fun(p, r) => Type::Fun(Rc::new(self.walk(p)), Rc::new(self.walk(r))),
            Type::Record(atts) => Type::Record(Rc::new(self.walk_record(atts))),
            Type::Pattern(items) => Type::Pattern(items.iter().map(|t| self.walk(t)).collect()),
            Type::UserType(_) | Type::Bool | Type::Int | Type::Float | Type::String | Type::DateTime
            | Type::Interval | Type::Regex | Type::AnyType => ty.clone(),
        }
    }

    fn representative_symbol(&self, _var: TypeVar, original: &Symbol) -> Symbol {
        original.clone()
    }

    pub fn walk_monoid(&mut self, m: &Monoid) -> Monoid {
        match m {
            Monoid::Variable(sym) => {
                let var = self.uf.monoid_var_for_symbol(sym);
                match self.uf.monoids.probe_value(var) {
                    Some(bound) => bound,
                    None => m.clone(),
                }
            }
            other => other.clone(),
        }
    }

    fn walk_record(&mut self, atts: &RecordAttributes) -> RecordAttributes {
        match atts {
            RecordAttributes::Attributes(fields) => RecordAttributes::Attributes(
                fields
                    .iter()
                    .map(|a| Attribute::new(a.idn.clone(), self.walk(&a.ty)))
                    .collect(),
            ),
            RecordAttributes::AttributesVariable(fields, sym) => {
                let var = self.uf.attr_var_for_symbol(sym);
                match self.uf.atts.probe_value(var) {
                    Some(bound) => self.walk_record(&bound),
                    None => RecordAttributes::AttributesVariable(
                        fields
                            .iter()
                            .map(|a| Attribute::new(a.idn.clone(), self.walk(&a.ty)))
                            .collect(),
                        sym.clone(),
                    ),
                }
            }
            RecordAttributes::ConcatAttributes(sym) => {
                if self.concat_defs.is_complete(sym) {
                    if let Some(flat) = self.concat_defs.flatten(sym, &self.symbols) {
                        return RecordAttributes::Attributes(
                            flat.into_iter().map(|a| Attribute::new(a.idn, self.walk(&a.ty))).collect(),
                        );
                    }
                }
                atts.clone()
            }
        }
    }

    // -- unify -------------------------------------------------------------

    pub fn unify(&mut self, t1: &Type, t2: &Type, pos1: Span, pos2: Span) -> Result<(), CalculusError> {
        let a = self.walk(t1);
        let b = self.walk(t2);
        self.unify_walked(&a, &b, pos1, pos2)
    }

    fn unify_walked(&mut self, a: &Type, b: &Type, pos1: Span, pos2: Span) -> Result<(), CalculusError> {
        use Type::*;
        match (a, b) {
            (AnyType, _) | (_, AnyType) => Ok(()),

            (TypeVariable(s1), TypeVariable(s2)) => {
                let v1 = self.uf.type_var_for_symbol(s1);
                let v2 = self.uf.type_var_for_symbol(s2);
                self.uf.types.union(v1, v2);
                Ok(())
            }
            (TypeVariable(s), other) | (other, TypeVariable(s)) => {
                if !self.check_variable_membership(other, None) {
                    return Err(mismatch(a, b, pos1, pos2));
                }
                let v = self.uf.type_var_for_symbol(s);
                self.uf
                    .types
                    .unify_var_value(v, Some(other.clone()))
                    .map_err(|_| mismatch(a, b, pos1, pos2))
            }
            (NumberType(s), other) | (other, NumberType(s)) => {
                if !self.check_variable_membership(other, Some(VarKind::Number)) {
                    return Err(mismatch(a, b, pos1, pos2));
                }
                let v = self.uf.type_var_for_symbol(s);
                self.uf
                    .types
                    .unify_var_value(v, Some(other.clone()))
                    .map_err(|_| mismatch(a, b, pos1, pos2))
            }
            (PrimitiveType(s), other) | (other, PrimitiveType(s)) => {
                if !self.check_variable_membership(other, Some(VarKind::Primitive)) {
                    return Err(mismatch(a, b, pos1, pos2));
                }
                let v = self.uf.type_var_for_symbol(s);
                self.uf
                    .types
                    .unify_var_value(v, Some(other.clone()))
                    .map_err(|_| mismatch(a, b, pos1, pos2))
            }

            (Bool, Bool) | (Int, Int) | (Float, Float) | (String, String) | (DateTime, DateTime)
            | (Interval, Interval) | (Regex, Regex) => Ok(()),

            (Collection(m1, i1), Collection(m2, i2)) => {
                self.unify_monoids(m1, m2, pos1)?;
                self.unify(i1, i2, pos1, pos2)
            }

            (Fun(p1, r1), Fun(p2, r2)) => {
                self.unify(p1, p2, pos1, pos2)?;
                self.unify(r1, r2, pos1, pos2)
            }

            (Record(r1), Record(r2)) => self.unify_attributes(r1, r2, pos1, pos2),

            (Pattern(items1), Pattern(items2)) => {
                if items1.len() != items2.len() {
                    return Err(mismatch(a, b, pos1, pos2));
                }
                for (x, y) in items1.iter().zip(items2.iter()) {
                    self.unify(x, y, pos1, pos2)?;
                }
                Ok(())
            }

            (UserType(s1), UserType(s2)) => {
                if s1 == s2 {
                    Ok(())
                } else {
                    self.unify_user_type_expansion(s1, s2, pos1, pos2)
                }
            }
            (UserType(s), other) | (other, UserType(s)) => {
                let expanded = self.expand_user_type(s, pos1)?;
                self.unify(&expanded, other, pos1, pos2)
            }

            _ => Err(mismatch(a, b, pos1, pos2)),
        }
    }

    fn unify_user_type_expansion(
        &mut self,
        s1: &Symbol,
        s2: &Symbol,
        pos1: Span,
        pos2: Span,
    ) -> Result<(), CalculusError> {
        // Two differently-named user types are never the same type (§4.1:
        // "UserType(s1) <-> UserType(s2) iff s1 = s2"); this path only
        // exists to produce a precise error rather than silently expanding.
        let _ = (self.expand_user_type(s1, pos1), self.expand_user_type(s2, pos2));
        Err(CalculusError::IncompatibleTypes {
            message: format!("distinct user types `{s1}` and `{s2}`"),
            pos1,
            pos2,
        })
    }

    fn expand_user_type(&mut self, sym: &Symbol, pos: Span) -> Result<Type, CalculusError> {
        if self.expanding.borrow().contains(sym) {
            return Err(CalculusError::InternalError {
                message: format!("cyclic user type expansion for `{sym}`"),
                pos,
            });
        }
        let Some(def) = self.user_types.get(sym).cloned() else {
            return Err(CalculusError::UnknownDecl {
                idn: sym.name().to_string(),
                pos,
            });
        };
        self.expanding.borrow_mut().push(sym.clone());
        let result = if self.expanding.borrow().len() > self.max_expansion_depth {
            Err(CalculusError::InternalError {
                message: format!("user type expansion too deep at `{sym}`"),
                pos,
            })
        } else {
            Ok(def)
        };
        self.expanding.borrow_mut().pop();
        result
    }

    /// Checks that a concrete type is an acceptable instantiation of a
    /// restricted variable kind (`NumberType` ⊆ {Int,Float},
    /// `PrimitiveType` ⊆ {Bool,Int,Float,String}); `None` means an
    /// unrestricted `TypeVariable`, which accepts anything.
    fn check_variable_membership(&self, candidate: &Type, kind_hint: Option<VarKind>) -> bool {
        match kind_hint {
            None => true,
            Some(VarKind::Number) => matches!(candidate, Type::Int | Type::Float | Type::NumberType(_)),
            Some(VarKind::Primitive) => matches!(
                candidate,
                Type::Bool | Type::Int | Type::Float | Type::String | Type::PrimitiveType(_)
            ),
        }
    }

    pub fn unify_attributes(
        &mut self,
        r1: &RecordAttributes,
        r2: &RecordAttributes,
        pos1: Span,
        pos2: Span,
    ) -> Result<(), CalculusError> {
        use RecordAttributes::*;
        match (r1, r2) {
            (Attributes(a1), Attributes(a2)) => {
                if a1.len() != a2.len() {
                    return Err(CalculusError::IncompatibleTypes {
                        message: format!("records of different arity ({} vs {})", a1.len(), a2.len()),
                        pos1,
                        pos2,
                    });
                }
                for (x, y) in a1.iter().zip(a2.iter()) {
                    if x.idn.name() != y.idn.name() {
                        return Err(CalculusError::IncompatibleTypes {
                            message: format!("field `{}` does not match field `{}`", x.idn, y.idn),
                            pos1,
                            pos2,
                        });
                    }
                    self.unify(&x.ty, &y.ty, pos1, pos2)?;
                }
                Ok(())
            }
            (AttributesVariable(fields1, s1), AttributesVariable(fields2, s2)) => {
                let mut merged = fields1.clone();
                for f2 in fields2 {
                    if let Some(existing) = merged.iter().find(|f| f.idn.name() == f2.idn.name()).cloned() {
                        self.unify(&existing.ty, &f2.ty, pos1, pos2)?;
                    } else {
                        merged.push(f2.clone());
                    }
                }
                let v1 = self.uf.attr_var_for_symbol(s1);
                let v2 = self.uf.attr_var_for_symbol(s2);
                self.uf.atts.union(v1, v2);
                let bound = AttributesVariable(merged, s1.clone());
                self.uf
                    .atts
                    .unify_var_value(v1, Some(bound))
                    .map_err(|_| CalculusError::InternalError {
                        message: "attribute variable union conflict".into(),
                        pos: pos1,
                    })
            }
            (AttributesVariable(fields, s), Attributes(concrete)) | (Attributes(concrete), AttributesVariable(fields, s)) => {
                for field in fields {
                    let Some(found) = concrete.iter().find(|a| a.idn.name() == field.idn.name()) else {
                        return Err(CalculusError::IncompatibleTypes {
                            message: format!("record is missing required field `{}`", field.idn),
                            pos1,
                            pos2,
                        });
                    };
                    self.unify(&field.ty, &found.ty, pos1, pos2)?;
                }
                let v = self.uf.attr_var_for_symbol(s);
                self.uf
                    .atts
                    .unify_var_value(v, Some(Attributes(concrete.clone())))
                    .map_err(|_| CalculusError::InternalError {
                        message: "attribute variable union conflict".into(),
                        pos: pos1,
                    })
            }
            (ConcatAttributes(s1), ConcatAttributes(s2)) => {
                let v1 = self.uf.attr_var_for_symbol(s1);
                let v2 = self.uf.attr_var_for_symbol(s2);
                self.uf.atts.union(v1, v2);
                let mut merged_slots: Vec<ConcatSlot> = self.concat_defs.slots(s1).unwrap_or(&[]).to_vec();
                merged_slots.extend(self.concat_defs.slots(s2).unwrap_or(&[]).iter().cloned());
                self.concat_defs.define(s1.clone(), merged_slots);
                Ok(())
            }
            (ConcatAttributes(s), Attributes(concrete)) | (Attributes(concrete), ConcatAttributes(s)) => {
                if self.concat_defs.is_complete(s) {
                    if let Some(flat) = self.concat_defs.flatten(s, &self.symbols) {
                        if flat.len() != concrete.len() {
                            return Err(CalculusError::IncompatibleTypes {
                                message: "concat record length mismatch".into(),
                                pos1,
                                pos2,
                            });
                        }
                        for (x, y) in flat.iter().zip(concrete.iter()) {
                            self.unify(&x.ty, &y.ty, pos1, pos2)?;
                        }
                        return Ok(());
                    }
                }
                // Incomplete concat against a fixed record: unify the known
                // prefix slots, per §4.1; remaining slots stay open.
                if let Some(slots) = self.concat_defs.slots(s).map(<[_]>::to_vec) {
                    for (slot, field) in slots.iter().zip(concrete.iter()) {
                        match slot {
                            ConcatSlot::Named(_, ty) => {
                                self.unify(ty, &field.ty, pos1, pos2)?;
                            }
                            ConcatSlot::Record(_) => {}
                        }
                    }
                }
                Ok(())
            }
            // AttributesVariable <-> ConcatAttributes: the open question
            // flagged in §9 ("the precise slot-set merging has edge
            // cases"). We take the conservative, documented-partial
            // resolution: union the classes and keep both sides' known
            // constraints, deferring full slot resolution to the concat's
            // own completion check.
            (AttributesVariable(fields, s1), ConcatAttributes(s2))
            | (ConcatAttributes(s2), AttributesVariable(fields, s1)) => {
                let v1 = self.uf.attr_var_for_symbol(s1);
                let v2 = self.uf.attr_var_for_symbol(s2);
                self.uf.atts.union(v1, v2);
                if self.concat_defs.is_complete(s2) {
                    if let Some(flat) = self.concat_defs.flatten(s2, &self.symbols) {
                        return self.unify_attributes(
                            &AttributesVariable(fields.clone(), s1.clone()),
                            &Attributes(flat),
                            pos1,
                            pos2,
                        );
                    }
                }
                Ok(())
            }
        }
    }

    pub fn unify_monoids(&mut self, m1: &Monoid, m2: &Monoid, pos: Span) -> Result<(), CalculusError> {
        let a = self.walk_monoid(m1);
        let b = self.walk_monoid(m2);
        match (&a, &b) {
            (Monoid::Variable(s1), Monoid::Variable(s2)) => {
                let v1 = self.uf.monoid_var_for_symbol(s1);
                let v2 = self.uf.monoid_var_for_symbol(s2);
                self.uf.monoids.union(v1, v2);
                self.monoid_graph.merge(s1, s2);
                if !self.monoid_graph.is_satisfiable(s1) {
                    return Err(CalculusError::IncompatibleMonoids {
                        message: format!("no monoid satisfies the bounds on `{s1}`"),
                        pos,
                    });
                }
                Ok(())
            }
            (Monoid::Variable(s), known) | (known, Monoid::Variable(s)) => {
                let bound = bound_for(known).ok_or_else(|| CalculusError::IncompatibleMonoids {
                    message: format!("`{known}` is not a collection monoid"),
                    pos,
                })?;
                self.monoid_graph.add_lower_bound(s.clone(), bound.clone());
                self.monoid_graph.add_upper_bound(s.clone(), bound);
                if !self.monoid_graph.is_satisfiable(s) {
                    return Err(CalculusError::IncompatibleMonoids {
                        message: format!("`{s}` cannot be `{known}`"),
                        pos,
                    });
                }
                let v = self.uf.monoid_var_for_symbol(s);
                self.uf
                    .monoids
                    .unify_var_value(v, Some(known.clone()))
                    .map_err(|_| CalculusError::IncompatibleMonoids {
                        message: format!("`{s}` cannot be `{known}`"),
                        pos,
                    })
            }
            _ if a == b => Ok(()),
            _ => Err(CalculusError::IncompatibleMonoids {
                message: format!("`{a}` is incompatible with `{b}`"),
                pos,
            }),
        }
    }

    /// `MaxOfMonoids`: check that a generator's source monoid `g` is ≤ the
    /// comprehension's monoid `m` in the partial order (§4.2).
    pub fn require_leq(&mut self, g: &Monoid, m: &Monoid, pos: Span) -> Result<(), CalculusError> {
        let g2 = self.walk_monoid(g);
        let m2 = self.walk_monoid(m);
        match (&g2, &m2) {
            (Monoid::Variable(s), known) => {
                if let Some(bound) = bound_for(known) {
                    self.monoid_graph.add_upper_bound(s.clone(), bound);
                    if !self.monoid_graph.is_satisfiable(s) {
                        return Err(CalculusError::IncompatibleMonoids {
                            message: format!("`{s}` cannot be bounded above by `{known}`"),
                            pos,
                        });
                    }
                }
                Ok(())
            }
            (known, Monoid::Variable(s)) => {
                if let Some(bound) = bound_for(known) {
                    self.monoid_graph.add_lower_bound(s.clone(), bound);
                    if !self.monoid_graph.is_satisfiable(s) {
                        return Err(CalculusError::IncompatibleMonoids {
                            message: format!("`{s}` cannot be bounded below by `{known}`"),
                            pos,
                        });
                    }
                }
                Ok(())
            }
            (g3, m3) => {
                let gp = g3.properties();
                let mp = m3.properties();
                match (gp, mp) {
                    (Some(gp), Some(mp)) if gp.within(MonoidProperties::new(false, false), mp) => Ok(()),
                    (Some(_), Some(_)) => Err(CalculusError::IncompatibleMonoids {
                        message: format!("`{g3}` is not compatible with comprehension monoid `{m3}`"),
                        pos,
                    }),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Narrow a resolved monoid variable to its concrete collection monoid
    /// once both bounds coincide (used by the analyzer once a comprehension
    /// finishes typing and needs a concrete monoid for its `Collection`).
    pub fn resolve_collection_monoid(&mut self, m: &Monoid) -> Monoid {
        let walked = self.walk_monoid(m);
        if let Monoid::Variable(sym) = &walked {
            let (min, max) = self.monoid_graph.bounds(sym);
            if min == max {
                if let Some(concrete) = collection_monoid_for(min) {
                    return concrete;
                }
            }
        }
        walked
    }
}

#[derive(Clone, Copy)]
enum VarKind {
    Number,
    Primitive,
}

use crate::monoid::MonoidProperties;

fn mismatch(a: &Type, b: &Type, pos1: Span, pos2: Span) -> CalculusError {
    CalculusError::IncompatibleTypes {
        message: format!("`{a}` is not compatible with `{b}`"),
        pos1,
        pos2,
    }
}

#[cfg(test)]
#[path = "tests/solver.rs"]
mod tests;
