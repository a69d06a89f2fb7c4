//! The type algebra (§3.1).
//!
//! Nullability is deliberately *not* a field of `Type`: §3.1 states the
//! equality invariant purely in terms of union-find roots and structural
//! children, and the nullability pass (§4.2) is a node-keyed side table, not
//! a structural rewrite of the type tree (design note: "per-node memoized
//! attributes become side tables keyed by node identity"). The boundary type
//! callers see, [`NullableType`], pairs a `Type` with the flag once the
//! nullability pass has run.

use mcalc_common::Symbol;
use std::rc::Rc;

use crate::monoid::Monoid;
use crate::record::RecordAttributes;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Bool,
    Int,
    Float,
    String,
    DateTime,
    Interval,
    Regex,
    Record(Rc<RecordAttributes>),
    Collection(Monoid, Rc<Type>),
    Fun(Rc<Type>, Rc<Type>),
    UserType(Symbol),
    /// An unlabeled product of pattern-attribute types, used for function
    /// parameters that destructure tuples.
    Pattern(Vec<Type>),
    TypeVariable(Symbol),
    /// ⊆ {Int, Float}
    NumberType(Symbol),
    /// ⊆ {Bool, Int, Float, String}
    PrimitiveType(Symbol),
    /// Unifies with anything (used as a best-effort substitute after a
    /// failed unification so downstream constraints can still proceed,
    /// §7 "Propagation policy").
    AnyType,
}

impl Type {
    #[must_use]
    pub fn collection(m: Monoid, inner: Type) -> Type {
        Type::Collection(m, Rc::new(inner))
    }

    #[must_use]
    pub fn fun(param: Type, result: Type) -> Type {
        Type::Fun(Rc::new(param), Rc::new(result))
    }

    #[must_use]
    pub fn record(atts: RecordAttributes) -> Type {
        Type::Record(Rc::new(atts))
    }

    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Type::TypeVariable(_) | Type::NumberType(_) | Type::PrimitiveType(_)
        )
    }

    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Type::Record(_))
    }

    /// Primitive numeric types, used by `NumberType` membership checks.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    #[must_use]
    pub fn is_primitive_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float | Type::String)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::DateTime => write!(f, "datetime"),
            Type::Interval => write!(f, "interval"),
            Type::Regex => write!(f, "regex"),
            Type::Record(atts) => write!(f, "{}", crate::pretty::format_record(atts)),
            Type::Collection(m, inner) => write!(f, "collection({m}, {inner})"),
            Type::Fun(p, r) => write!(f, "({p}) -> {r}"),
            Type::UserType(s) => write!(f, "{s}"),
            Type::Pattern(items) => {
                write!(f, "(")?;
                for (i, t) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
            Type::TypeVariable(s) => write!(f, "{s}"),
            Type::NumberType(s) => write!(f, "number({s})"),
            Type::PrimitiveType(s) => write!(f, "primitive({s})"),
            Type::AnyType => write!(f, "any"),
        }
    }
}

/// A type paired with the nullability flag computed by the post-pass
/// (§4.2 "Nullability pass"). This is the shape returned at the compiler's
/// external boundary (§6 "Type").
#[derive(Clone, Debug, PartialEq)]
pub struct NullableType {
    pub ty: Type,
    pub nullable: bool,
}

impl NullableType {
    #[must_use]
    pub fn new(ty: Type, nullable: bool) -> Self {
        NullableType { ty, nullable }
    }

    #[must_use]
    pub fn non_null(ty: Type) -> Self {
        NullableType { ty, nullable: false }
    }
}

impl std::fmt::Display for NullableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// `TypeScheme(t, freeTypeSyms, freeMonoidSyms, freeAttSyms)` (§3.1):
/// a polymorphic binding produced at `Bind` sites by let-polymorphism.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeScheme {
    pub body: Type,
    pub free_type_syms: Vec<Symbol>,
    pub free_monoid_syms: Vec<Symbol>,
    pub free_att_syms: Vec<Symbol>,
}

impl TypeScheme {
    #[must_use]
    pub fn monomorphic(ty: Type) -> Self {
        TypeScheme {
            body: ty,
            free_type_syms: Vec::new(),
            free_monoid_syms: Vec::new(),
            free_att_syms: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_monomorphic(&self) -> bool {
        self.free_type_syms.is_empty() && self.free_monoid_syms.is_empty() && self.free_att_syms.is_empty()
    }
}
