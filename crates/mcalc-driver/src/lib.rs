//! The top-level `compile()` facade (§5, §6, §7): wires the pipeline in
//! the exact order given in §2 - semantic analysis, then the desugarers,
//! then the normalizer/canonicalizer, then the unnester - owns the
//! `World`, and is the single public re-export surface a CLI/HTTP wrapper
//! (out of scope for this core) would call.
//!
//! Per §5 "Scheduling model", a compile is a pure function of `(Tree,
//! World, CompileOptions)` to `(AlgebraNode, NullableType, errors)`: this
//! crate owns the `NodeIdGenerator`/`SymbolGenerator` for one call's
//! lifetime only and never shares them across calls. A caller wanting to
//! run multiple compiles in parallel instantiates one independent
//! `compile()` call per compilation - there is no shared mutable state to
//! coordinate beyond the read-only `World`.

pub mod options;
pub mod world;

use std::rc::Rc;

use mcalc_ast::{Expr, NodeIdGenerator, World};
use mcalc_common::{CalculusError, SymbolGenerator};
use mcalc_types::NullableType;
use mcalc_unnest::AlgebraNode;

pub use options::CompileOptions;

/// Everything §6 "Outputs" promises: the algebra tree (absent when
/// `errors` is non-empty, §7 "User-facing failure is 'compile returned a
/// non-empty error list and no algebra tree'"), the walk-resolved,
/// nullability-annotated type of the original expression, and the
/// accumulated diagnostics.
pub struct CompileResult {
    pub algebra: Option<AlgebraNode>,
    pub ty: Option<NullableType>,
    pub errors: Vec<CalculusError>,
}

impl CompileResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the full pipeline (§2) over `root` against `world`.
///
/// §7 "Propagation policy": the analyzer accumulates errors rather than
/// aborting on the first one. Later passes (desugar/canonicalize/unnest)
/// short-circuit entirely when the analyzer reported any error - they
/// assume a fully-typed, entity-resolved tree, and running them over a
/// best-effort `AnyType` substitution would only produce confusing
/// downstream noise rather than new information for the caller.
#[must_use]
pub fn compile(root: &Expr, world: World, options: CompileOptions) -> CompileResult {
    tracing::debug!("compile: validating world catalog");
    let mut errors = world::validate(&world);
    if !errors.is_empty() {
        return CompileResult { algebra: None, ty: None, errors };
    }

    let ids = Rc::new(NodeIdGenerator::new());
    let symbols = Rc::new(SymbolGenerator::new());

    tracing::debug!("compile: running semantic analysis");
    let analysis = mcalc_analyzer::Analyzer::new(world, symbols.clone())
        .with_max_expansion_depth(options.max_unification_depth)
        .analyze(root);
    let root_ty = NullableType::new(analysis.root_type.clone(), analysis.root_nullable);
    if !analysis.errors.is_empty() {
        tracing::debug!(count = analysis.errors.len(), "compile: analyzer reported errors, stopping");
        return CompileResult { algebra: None, ty: Some(root_ty), errors: analysis.errors };
    }

    tracing::debug!("compile: desugaring");
    let desugared = mcalc_desugar::desugar(root, &analysis, ids.clone(), symbols.clone());

    tracing::debug!("compile: canonicalizing");
    let canon = mcalc_canon::canonicalize(&desugared.expr, desugared.types, ids.clone(), symbols.clone());

    tracing::debug!("compile: unnesting");
    // Every pass above shares the same `ids`/`symbols` generators (§9
    // "Fresh symbols": one monotonic counter for the whole compile), so
    // the unnester's own fresh hoisting variables are minted from the
    // identical live instance rather than a disconnected one.
    let canon_ctx = mcalc_canon::CanonCtx {
        builder: mcalc_ast::Builder::new(ids, symbols.clone()),
        symbols,
        types: canon.types,
    };
    let mut unnest_ctx = mcalc_unnest::UnnestCtx::new(canon_ctx);
    match mcalc_unnest::unnest(&canon.expr, &mut unnest_ctx) {
        Ok(algebra) => CompileResult { algebra: Some(algebra), ty: Some(root_ty), errors: Vec::new() },
        Err(e) => {
            errors.push(e);
            CompileResult { algebra: None, ty: Some(root_ty), errors }
        }
    }
}

/// Installs a `tracing-subscriber` `EnvFilter` layer reading
/// `RUST_LOG`/`MCALC_LOG`, for a CLI/HTTP wrapper to opt into (§10.2).
/// The core crates (`mcalc-types`, `mcalc-ast`, ..., `mcalc-unnest`)
/// depend only on the `tracing` facade, never on `tracing-subscriber`
/// itself; only this optional feature of the driver crate does.
#[cfg(feature = "cli-logging")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("MCALC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests;
