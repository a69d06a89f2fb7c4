//! `selectStarType` / `selectPartitionType` (§4.2).

use mcalc_ast::{Pattern, Qualifier};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type};

/// A generator's pattern-derived prefix name, used both for `*`'s implicit
/// concat slots and for partition's record fields: the pattern's single
/// identifier, or `None` for an anonymous/`_k` generator.
fn generator_prefix(q: &Qualifier) -> Option<String> {
    match q {
        Qualifier::Gen(Some(Pattern::Idn(s, _)), _) => Some(s.name().to_string()),
        _ => None,
    }
}

fn generators(from: &[Qualifier]) -> Vec<&Qualifier> {
    from.iter().filter(|q| matches!(q, Qualifier::Gen(..))).collect()
}

/// `selectStarType` (§4.2): the type `*` resolves to in a `Select.proj`.
/// `gen_inner_types` gives each generator's already-inferred inner
/// (non-collection) type in `from` order.
pub fn select_star_type(
    from: &[Qualifier],
    gen_inner_types: &[Type],
    group_by: bool,
    solver: &mut mcalc_types::TypeSolver,
) -> Type {
    let gens = generators(from);
    debug_assert_eq!(gens.len(), gen_inner_types.len());
    if gens.len() == 1 {
        let inner = gen_inner_types[0].clone();
        return if group_by {
            Type::collection(solver.fresh_monoid_var(), inner)
        } else {
            inner
        };
    }
    let mut seen = std::collections::HashMap::new();
    let mut atts = Vec::new();
    for (q, ty) in gens.iter().zip(gen_inner_types) {
        let base = generator_prefix(q).unwrap_or_default();
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 { base } else { format!("{base}_{count}") };
        atts.push((name, ty.clone()));
    }
    let record = Type::record(RecordAttributes::Attributes(
        atts.into_iter()
            .map(|(name, ty)| Attribute::new(solver.symbols.declare(name), ty))
            .collect(),
    ));
    if group_by {
        Type::collection(solver.fresh_monoid_var(), record)
    } else {
        record
    }
}

/// `selectPartitionType` (§4.2): the type `partition` resolves to in a
/// group-by `Select.proj`, always a collection of the group's rows.
pub fn select_partition_type(
    from: &[Qualifier],
    gen_inner_types: &[Type],
    solver: &mut mcalc_types::TypeSolver,
) -> Type {
    let gens = generators(from);
    let inner = if gens.len() == 1 {
        gen_inner_types[0].clone()
    } else {
        let mut seen = std::collections::HashMap::new();
        let atts = gens
            .iter()
            .zip(gen_inner_types)
            .map(|(q, ty)| {
                let base = generator_prefix(q).unwrap_or_default();
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                let name = if *count == 1 { base } else { format!("{base}_{count}") };
                Attribute::new(solver.symbols.declare(name), ty.clone())
            })
            .collect();
        Type::record(RecordAttributes::Attributes(atts))
    };
    Type::collection(Monoid::Bag, inner)
}
