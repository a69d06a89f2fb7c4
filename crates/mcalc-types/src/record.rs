//! Record attribute models (§3.1 "Record"): the three shapes a record's
//! attribute list can take, realizing row polymorphism.

use mcalc_common::Symbol;

use crate::ty::Type;

/// One named, typed field of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub idn: Symbol,
    pub ty: Type,
}

impl Attribute {
    #[must_use]
    pub fn new(idn: Symbol, ty: Type) -> Self {
        Attribute { idn, ty }
    }
}

/// A slot in a `ConcatAttributes` record: either one named attribute with a
/// known type, or an entire record whose attributes get spliced in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConcatSlot {
    Named(Symbol, Type),
    Record(Type),
}

/// The three shapes of record attributes (§3.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordAttributes {
    /// A fixed, ordered, arity-closed attribute list. Identifiers are
    /// unique within it.
    Attributes(Vec<Attribute>),
    /// An open row: known `(idn, type)` constraints plus a `Symbol` naming
    /// the union-find class this variable belongs to. The true arity is
    /// not yet known.
    AttributesVariable(Vec<Attribute>, Symbol),
    /// A record whose attribute sequence is the concatenation of several
    /// slots; resolves to `Attributes` once every slot is a concrete
    /// record (or already a named attribute).
    ConcatAttributes(Symbol),
}

impl RecordAttributes {
    #[must_use]
    pub fn arity(&self) -> Option<usize> {
        match self {
            RecordAttributes::Attributes(atts) => Some(atts.len()),
            RecordAttributes::AttributesVariable(..) | RecordAttributes::ConcatAttributes(_) => None,
        }
    }

    #[must_use]
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        match self {
            RecordAttributes::Attributes(atts) | RecordAttributes::AttributesVariable(atts, _) => {
                atts.iter().find(|a| a.idn.name() == name)
            }
            RecordAttributes::ConcatAttributes(_) => None,
        }
    }
}

/// Side table mapping each `ConcatAttributes` symbol to its ordered list of
/// slots (design note "concat-definition table"). Kept out of the `Type`
/// tree itself since slots can reference other, not-yet-resolved concat
/// records.
#[derive(Debug, Default, Clone)]
pub struct ConcatDefinitions {
    defs: rustc_hash::FxHashMap<Symbol, Vec<ConcatSlot>>,
}

impl ConcatDefinitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, sym: Symbol, slots: Vec<ConcatSlot>) {
        self.defs.insert(sym, slots);
    }

    #[must_use]
    pub fn slots(&self, sym: &Symbol) -> Option<&[ConcatSlot]> {
        self.defs.get(sym).map(Vec::as_slice)
    }

    /// A `ConcatAttributes` is "complete" once every slot resolves to a
    /// concrete type (either a non-record type, making it a named
    /// attribute, or a fully-resolved `Attributes` record).
    #[must_use]
    pub fn is_complete(&self, sym: &Symbol) -> bool {
        self.defs.get(sym).is_some_and(|slots| {
            slots.iter().all(|slot| match slot {
                ConcatSlot::Named(_, ty) => !matches!(ty, Type::Record(r) if matches!(r.as_ref(), RecordAttributes::ConcatAttributes(_) | RecordAttributes::AttributesVariable(..))),
                ConcatSlot::Record(ty) => matches!(ty, Type::Record(r) if matches!(r.as_ref(), RecordAttributes::Attributes(_))),
            })
        })
    }

    /// Flatten a complete concat definition into its resolved attribute
    /// list, resolving name collisions by suffixing `_k` (§4.2
    /// `selectStarType` rule), where `k` is the 1-based occurrence index.
    #[must_use]
    pub fn flatten(&self, sym: &Symbol, gen: &mcalc_common::SymbolGenerator) -> Option<Vec<Attribute>> {
        let slots = self.defs.get(sym)?;
        let mut out: Vec<Attribute> = Vec::new();
        let mut seen: rustc_hash::FxHashMap<String, u32> = rustc_hash::FxHashMap::default();
        let mut push = |idn: Symbol, ty: Type, out: &mut Vec<Attribute>| {
            let base = idn.name().to_string();
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let name = if *count == 1 {
                base
            } else {
                format!("{base}_{count}")
            };
            out.push(Attribute::new(gen.declare(name), ty));
        };
        for slot in slots {
            match slot {
                ConcatSlot::Named(idn, ty) => push(idn.clone(), ty.clone(), &mut out),
                ConcatSlot::Record(ty) => {
                    if let Type::Record(r) = ty {
                        if let RecordAttributes::Attributes(atts) = r.as_ref() {
                            for a in atts {
                                push(a.idn.clone(), a.ty.clone(), &mut out);
                            }
                        } else {
                            return None;
                        }
                    } else {
                        return None;
                    }
                }
            }
        }
        Some(out)
    }
}
