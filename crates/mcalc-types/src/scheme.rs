//! Let-polymorphism: generalizing a `Bind`'s inferred type into a
//! `TypeScheme` and instantiating a scheme afresh at each use (§4.2
//! "Let-polymorphism", §8 invariant 5).

use mcalc_common::Symbol;
use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::monoid::Monoid;
use crate::record::{Attribute, RecordAttributes};
use crate::solver::TypeSolver;
use crate::ty::{Type, TypeScheme};

impl TypeSolver {
    /// Snapshot the symbol-counter watermark before typing a `Bind`'s
    /// right-hand side; every variable symbol created at or after this
    /// point and still free in the walked result type is generalized.
    #[must_use]
    pub fn snapshot(&self) -> u32 {
        self.symbols.watermark()
    }

    /// Build the `TypeScheme` for a `Bind` whose right-hand side had type
    /// `ty`, given the watermark captured before typing it.
    pub fn generalize(&mut self, watermark: u32, ty: &Type) -> TypeScheme {
        let walked = self.walk(ty);
        let mut type_syms = Vec::new();
        let mut monoid_syms = Vec::new();
        let mut att_syms = Vec::new();
        self.collect_free(&walked, watermark, &mut type_syms, &mut monoid_syms, &mut att_syms);
        dedup(&mut type_syms);
        dedup(&mut monoid_syms);
        dedup(&mut att_syms);
        TypeScheme {
            body: walked,
            free_type_syms: type_syms,
            free_monoid_syms: monoid_syms,
            free_att_syms: att_syms,
        }
    }

    fn collect_free(
        &mut self,
        ty: &Type,
        watermark: u32,
        type_syms: &mut Vec<Symbol>,
        monoid_syms: &mut Vec<Symbol>,
        att_syms: &mut Vec<Symbol>,
    ) {
        match ty {
            Type::TypeVariable(s) | Type::NumberType(s) | Type::PrimitiveType(s) => {
                if s.id() >= watermark {
                    type_syms.push(s.clone());
                }
            }
            Type::Collection(m, inner) => {
                if let Monoid::Variable(s) = m {
                    if s.id() >= watermark {
                        monoid_syms.push(s.clone());
                    }
                }
                self.collect_free(inner, watermark, type_syms, monoid_syms, att_syms);
            }
            Type::Fun(p, r) => {
                self.collect_free(p, watermark, type_syms, monoid_syms, att_syms);
                self.collect_free(r, watermark, type_syms, monoid_syms, att_syms);
            }
            Type::Pattern(items) => {
                for t in items {
                    self.collect_free(t, watermark, type_syms, monoid_syms, att_syms);
                }
            }
            Type::Record(atts) => {
                match atts.as_ref() {
                    RecordAttributes::Attributes(fields) => {
                        for f in fields {
                            self.collect_free(&f.ty, watermark, type_syms, monoid_syms, att_syms);
                        }
                    }
                    RecordAttributes::AttributesVariable(fields, s) => {
                        if s.id() >= watermark {
                            att_syms.push(s.clone());
                        }
                        for f in fields {
                            self.collect_free(&f.ty, watermark, type_syms, monoid_syms, att_syms);
                        }
                    }
                    RecordAttributes::ConcatAttributes(s) => {
                        if s.id() >= watermark {
                            att_syms.push(s.clone());
                        }
                    }
                }
            }
            Type::UserType(_)
            | Type::Bool
            | Type::Int
            | Type::Float
            | Type::String
            | Type::DateTime
            | Type::Interval
            | Type::Regex
            | Type::AnyType => {}
        }
    }

    /// Instantiate a `TypeScheme` by freshening its free symbols and
    /// substituting them through the body (§4.2). A scheme with no free
    /// symbols returns its body unchanged (§8 invariant 5).
    pub fn instantiate(&mut self, scheme: &TypeScheme) -> Type {
        if scheme.is_monomorphic() {
            return scheme.body.clone();
        }
        let mut type_subst: FxHashMap<Symbol, Symbol> = FxHashMap::default();
        let mut monoid_subst: FxHashMap<Symbol, Symbol> = FxHashMap::default();
        let mut att_subst: FxHashMap<Symbol, Symbol> = FxHashMap::default();
        for s in &scheme.free_type_syms {
            let fresh = self.symbols.fresh("t");
            self.uf.type_var_for_symbol(&fresh);
            type_subst.insert(s.clone(), fresh);
        }
        for s in &scheme.free_monoid_syms {
            let fresh = self.symbols.fresh("m");
            self.uf.monoid_var_for_symbol(&fresh);
            monoid_subst.insert(s.clone(), fresh);
        }
        for s in &scheme.free_att_syms {
            let fresh = self.symbols.fresh("r");
            self.uf.attr_var_for_symbol(&fresh);
            att_subst.insert(s.clone(), fresh);
        }
        substitute(&scheme.body, &type_subst, &monoid_subst, &att_subst)
    }
}

fn substitute(
    ty: &Type,
    type_subst: &FxHashMap<Symbol, Symbol>,
    monoid_subst: &FxHashMap<Symbol, Symbol>,
    att_subst: &FxHashMap<Symbol, Symbol>,
) -> Type {
    match ty {
        Type::TypeVariable(s) => Type::TypeVariable(type_subst.get(s).cloned().unwrap_or_else(|| s.clone())),
        Type::NumberType(s) => Type::NumberType(type_subst.get(s).cloned().unwrap_or_else(|| s.clone())),
        Type::PrimitiveType(s) => Type::PrimitiveType(type_subst.get(s).cloned().unwrap_or_else(|| s.clone())),
        Type::Collection(m, inner) => {
            let m2 = match m {
                Monoid::Variable(s) => {
                    Monoid::Variable(monoid_subst.get(s).cloned().unwrap_or_else(|| s.clone()))
                }
                other => other.clone(),
            };
            Type::Collection(m2, Rc::new(substitute(inner, type_subst, monoid_subst, att_subst)))
        }
        Type::Fun(p, r) => Type::Fun(
            Rc::new(substitute(p, type_subst, monoid_subst, att_subst)),
            Rc::new(substitute(r, type_subst, monoid_subst, att_subst)),
        ),
        Type::Pattern(items) => Type::Pattern(
            items.iter().map(|t| substitute(t, type_subst, monoid_subst, att_subst)).collect(),
        ),
        Type::Record(atts) => Type::Record(Rc::new(substitute_record(atts, type_subst, monoid_subst, att_subst))),
        Type::UserType(_)
        | Type::Bool
        | Type::Int
        | Type::Float
        | Type::String
        | Type::DateTime
        | Type::Interval
        | Type::Regex
        | Type::AnyType => ty.clone(),
    }
}

fn substitute_record(
    atts: &RecordAttributes,
    type_subst: &FxHashMap<Symbol, Symbol>,
    monoid_subst: &FxHashMap<Symbol, Symbol>,
    att_subst: &FxHashMap<Symbol, Symbol>,
) -> RecordAttributes {
    let sub_fields = |fields: &[Attribute]| -> Vec<Attribute> {
        fields
            .iter()
            .map(|a| Attribute::new(a.idn.clone(), substitute(&a.ty, type_subst, monoid_subst, att_subst)))
            .collect()
    };
    match atts {
        RecordAttributes::Attributes(fields) => RecordAttributes::Attributes(sub_fields(fields)),
        RecordAttributes::AttributesVariable(fields, s) => RecordAttributes::AttributesVariable(
            sub_fields(fields),
            att_subst.get(s).cloned().unwrap_or_else(|| s.clone()),
        ),
        RecordAttributes::ConcatAttributes(s) => {
            RecordAttributes::ConcatAttributes(att_subst.get(s).cloned().unwrap_or_else(|| s.clone()))
        }
    }
}

fn dedup(syms: &mut Vec<Symbol>) {
    let mut seen = std::collections::HashSet::new();
    syms.retain(|s| seen.insert(s.clone()));
}
