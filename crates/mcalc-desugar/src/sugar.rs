//! Sugar operators (§4.3): `Sum`/`Max`/`Min`/`Avg`/`Count`/`Exists`/`In`
//! lower to plain comprehensions over a fresh bound variable. `Sum`/`Avg`/
//! `Count` first force a `Set` source to a `Bag` via `ToBag` - they're
//! duplicate-sensitive, so deduplicating the source before reducing it
//! would silently change the answer. `Max`/`Min` don't: both are
//! idempotent, so a duplicate row can never change the extremum (see
//! `DESIGN.md`, "Max/Min skip the Set -> Bag coercion").

use mcalc_ast::{BinaryOp, Expr, ExprKind, Qualifier, UnaryOp};
use mcalc_common::Span;
use mcalc_types::{Monoid, Type};

use crate::DesugarCtx;

fn is_set(ty: &Type) -> bool {
    matches!(crate::collection_monoid(ty), Some(Monoid::Set))
}

/// Desugar a reduction source: recurse into `inner`, wrapping it in
/// `ToBag` first when `force_bag` is set and the original source is a
/// `Set`.
fn reduce_source(inner: &Expr, force_bag: bool, span: Span, ctx: &mut DesugarCtx) -> (Expr, Type) {
    let inner_ty = ctx.type_of(inner);
    let elem_ty = crate::collection_inner(&inner_ty);
    let desugared = crate::desugar_expr(inner, ctx);
    if force_bag && is_set(&inner_ty) {
        let wrapped = ctx.builder.unary(UnaryOp::ToBag, desugared, span);
        ctx.record_type(wrapped.id, Type::collection(Monoid::Bag, elem_ty.clone()));
        (wrapped, elem_ty)
    } else {
        (desugared, elem_ty)
    }
}

/// `for x <- source yield m body(x)`, where `body` returns the yielded
/// expression and its type. `m` is a primitive monoid, so the
/// comprehension's own type is the body's type (§4.2 `Comp` rule).
fn reduce_comp(
    source: Expr,
    elem_ty: Type,
    m: Monoid,
    span: Span,
    ctx: &mut DesugarCtx,
    body: impl FnOnce(&Expr, &mut DesugarCtx) -> (Expr, Type),
) -> Expr {
    let (sym, pat) = ctx.builder.fresh_idn_pattern("x", span);
    let idn = ctx.builder.idn(sym, span);
    ctx.record_type(idn.id, elem_ty);
    let gen = Qualifier::Gen(Some(pat), source);
    let (body_expr, body_ty) = body(&idn, ctx);
    let comp = ctx.builder.comp(m, vec![gen], body_expr, span);
    ctx.record_type(comp.id, body_ty);
    comp
}

pub fn desugar_sum(inner: &Expr, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let (source, elem_ty) = reduce_source(inner, true, span, ctx);
    reduce_comp(source, elem_ty, Monoid::Sum, span, ctx, |x, ctx| {
        (x.clone(), ctx.type_of(x))
    })
}

pub fn desugar_extremum(inner: &Expr, m: Monoid, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let (source, elem_ty) = reduce_source(inner, false, span, ctx);
    reduce_comp(source, elem_ty, m, span, ctx, |x, ctx| (x.clone(), ctx.type_of(x)))
}

pub fn desugar_count(inner: &Expr, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let (source, elem_ty) = reduce_source(inner, true, span, ctx);
    reduce_comp(source, elem_ty, Monoid::Sum, span, ctx, |_x, ctx| {
        let one = ctx.builder.mk(span, ExprKind::IntConst(1));
        ctx.record_type(one.id, Type::Int);
        (one.clone(), Type::Int)
    })
}

/// `Avg(e) = Sum(e') / Count(e')`, forced to `Float` (§4.2's `Avg` rule
/// always yields `Float` regardless of the element's number type; the
/// generic `Div` inference rule would instead unify both sides' number
/// type and could resolve to `Int`, so the result is recorded explicitly
/// rather than left to `infer_binary`, see `DESIGN.md`).
pub fn desugar_avg(inner: &Expr, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let sum = desugar_sum(inner, span, ctx);
    let count = desugar_count(inner, span, ctx);
    let div = ctx.builder.binary(BinaryOp::Div, sum, count, span);
    ctx.record_type(div.id, Type::Float);
    div
}

pub fn desugar_exists(inner: &Expr, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let (source, elem_ty) = reduce_source(inner, false, span, ctx);
    reduce_comp(source, elem_ty, Monoid::Or, span, ctx, |_x, ctx| {
        let t = ctx.builder.bool_const(true, span);
        ctx.record_type(t.id, Type::Bool);
        (t.clone(), Type::Bool)
    })
}

pub fn desugar_in(e1: &Expr, e2: &Expr, span: Span, ctx: &mut DesugarCtx) -> Expr {
    let e1 = crate::desugar_expr(e1, ctx);
    let (source, elem_ty) = reduce_source(e2, false, span, ctx);
    reduce_comp(source, elem_ty, Monoid::Or, span, ctx, |x, ctx| {
        let eq = ctx.builder.binary(BinaryOp::Eq, x.clone(), e1, span);
        ctx.record_type(eq.id, Type::Bool);
        (eq.clone(), Type::Bool)
    })
}
