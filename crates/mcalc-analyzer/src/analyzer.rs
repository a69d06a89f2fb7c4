//! The semantic analyzer (§4.2): scope resolution, entity binding, eager
//! constraint generation + unification, monoid checks, and let-polymorphism.
//! Runs directly over the surface calculus tree, before desugaring (§2:
//! the analyzer precedes the desugarers in pipeline order).

use std::rc::Rc;

use mcalc_ast::{BinaryOp, Entity, Expr, ExprKind, NodeId, Pattern, Qualifier, Select, UnaryOp, World};
use mcalc_common::{CalculusError, Diagnostics, Span, Symbol, SymbolGenerator};
use mcalc_types::{Attribute, Monoid, RecordAttributes, Type, TypeScheme, TypeSolver};
use rustc_hash::FxHashMap;

use crate::env::Environments;
use crate::nullability::compute_nullability;
use crate::select_type::{select_partition_type, select_star_type};

pub struct AnalysisResult {
    pub types: FxHashMap<NodeId, Type>,
    pub nullable: FxHashMap<NodeId, bool>,
    pub entities: FxHashMap<NodeId, Entity>,
    pub errors: Vec<CalculusError>,
    pub root_type: Type,
    pub root_nullable: bool,
}

pub struct Analyzer {
    pub solver: TypeSolver,
    symbols: Rc<SymbolGenerator>,
    world: World,
    envs: Environments,
    types: FxHashMap<NodeId, Type>,
    entities: FxHashMap<NodeId, Entity>,
    diags: Diagnostics,
    schemes: FxHashMap<Symbol, TypeScheme>,
}

impl Analyzer {
    #[must_use]
    pub fn new(world: World, symbols: Rc<SymbolGenerator>) -> Self {
        let user_types = world.tipes.clone();
        Analyzer {
            solver: TypeSolver::new(symbols.clone(), user_types),
            symbols,
            world,
            envs: Environments::new(),
            types: FxHashMap::default(),
            entities: FxHashMap::default(),
            diags: Diagnostics::new(),
            schemes: FxHashMap::default(),
        }
    }

    /// Overrides the occurs-check recursion ceiling (§9 "Cyclic type
    /// references") from its `mcalc_common::limits` default, per
    /// `mcalc-driver::CompileOptions::max_unification_depth`.
    #[must_use]
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.solver.set_max_expansion_depth(depth);
        self
    }

    pub fn analyze(mut self, root: &Expr) -> AnalysisResult {
        tracing::debug!("analyzer: starting");
        let root_ty = self.infer(root);
        let walked: FxHashMap<NodeId, Type> =
            self.types.iter().map(|(id, t)| (*id, self.solver_walk(t))).collect();
        let root_ty = self.solver_walk(&root_ty);
        let nullable = compute_nullability(root, &walked, &self.entities);
        let root_nullable = nullable.get(&root.id).copied().unwrap_or(false);
        tracing::debug!(errors = self.diags.as_slice().len(), "analyzer: finished");
        AnalysisResult {
            types: walked,
            nullable,
            entities: self.entities,
            errors: self.diags.into_vec(),
            root_type: root_ty,
            root_nullable,
        }
    }

    fn solver_walk(&mut self, ty: &Type) -> Type {
        self.solver.walk(ty)
    }

    fn record_type(&mut self, id: NodeId, ty: Type) -> Type {
        self.types.insert(id, ty.clone());
        ty
    }

    fn error(&mut self, e: CalculusError) {
        self.diags.push(e);
    }

    fn unify(&mut self, t1: &Type, t2: &Type, p1: Span, p2: Span) -> Type {
        if let Err(e) = self.solver.unify(t1, t2, p1, p2) {
            self.error(e);
            // Best-effort recovery: substitute `AnyType` so downstream
            // constraints still get a type to work with (§7 "Propagation
            // policy").
            return Type::AnyType;
        }
        t1.clone()
    }

    // -- identifier resolution -------------------------------------------

    fn declare_idn(&mut self, sym: &Symbol, entity: Entity, span: Span) {
        let collided = self.envs.idn.declare(sym.name(), entity.clone());
        if collided {
            self.error(CalculusError::MultipleDecl {
                idn: sym.name().to_string(),
                pos1: span,
                pos2: span,
            });
            self.envs.idn.declare(sym.name(), Entity::Multiple);
        }
    }

    fn resolve_idn(&mut self, sym: &Symbol, span: Span) -> (Entity, Type) {
        if let Some(entity) = self.envs.idn.lookup(sym.name()).cloned() {
            let ty = match &entity {
                Entity::Variable(var_sym, _) => {
                    if let Some(scheme) = self.schemes.get(var_sym.name()).cloned() {
                        self.solver.instantiate(&scheme)
                    } else {
                        entity.ty().unwrap_or(Type::AnyType)
                    }
                }
                Entity::GenAttribute(_, gen, idx) | Entity::IntoAttribute(_, gen, idx) => {
                    self.field_type_by_index(gen, *idx)
                }
                Entity::DataSource(name) => self
                    .world
                    .source(name.name())
                    .cloned()
                    .map_or(Type::AnyType, |t| source_collection_type(t, &mut self.solver)),
                Entity::Partition(_, t) | Entity::Star(_, t) => t.clone(),
                Entity::Multiple => Type::AnyType,
                Entity::Unknown => Type::AnyType,
            };
            return (entity, ty);
        }
        // A `World::sources` entry may register either a source's element
        // type (its physical monoid left open, to be pinned down by
        // whatever the enclosing comprehension requires) or an already
        // concrete `Collection` (a source whose representation is fixed,
        // e.g. known to be a deduplicating `Set`); either way a reference
        // resolves to a `Collection`.
        if let Some(t) = self.world.source(sym.name()).cloned() {
            let entity = Entity::DataSource(sym.clone());
            return (entity, source_collection_type(t, &mut self.solver));
        }
        self.error(CalculusError::UnknownDecl {
            idn: sym.name().to_string(),
            pos: span,
        });
        (Entity::Unknown, Type::AnyType)
    }

    fn field_type_by_index(&mut self, gen: &Expr, idx: usize) -> Type {
        let gen_ty = self.types.get(&gen.id).cloned().unwrap_or(Type::AnyType);
        let inner = collection_inner(&gen_ty).unwrap_or(Type::AnyType);
        match self.solver.walk(&inner) {
            Type::Record(atts) => match atts.as_ref() {
                RecordAttributes::Attributes(fields) => {
                    fields.get(idx).map(|a| a.ty.clone()).unwrap_or(Type::AnyType)
                }
                _ => Type::AnyType,
            },
            other => other,
        }
    }

    // -- pattern binding ---------------------------------------------------

    /// Bind a pattern against a type in the idn environment. `PatternProd`
    /// destructures a `Pattern`/`Record` type positionally.
    fn bind_pattern(&mut self, p: &Pattern, ty: &Type) {
        match p {
            Pattern::Idn(sym, span) => {
                self.declare_idn(sym, Entity::Variable(sym.clone(), ty.clone()), *span);
            }
            Pattern::Prod(items, span) => {
                let walked = self.solver.walk(ty);
                let component_types: Vec<Type> = match &walked {
                    Type::Pattern(ts) => ts.clone(),
                    Type::Record(atts) => match atts.as_ref() {
                        RecordAttributes::Attributes(fields) => fields.iter().map(|a| a.ty.clone()).collect(),
                        _ => {
                            self.error(CalculusError::PatternMismatch {
                                message: "cannot destructure an open record by position".into(),
                                pos: *span,
                            });
                            items.iter().map(|_| Type::AnyType).collect()
                        }
                    },
                    _ => {
                        self.error(CalculusError::PatternMismatch {
                            message: format!("`{walked}` is not a product type"),
                            pos: *span,
                        });
                        items.iter().map(|_| Type::AnyType).collect()
                    }
                };
                if component_types.len() != items.len() {
                    self.error(CalculusError::PatternMismatch {
                        message: format!(
                            "pattern of arity {} does not match value of arity {}",
                            items.len(),
                            component_types.len()
                        ),
                        pos: *span,
                    });
                }
                for (item, t) in items.iter().zip(component_types.iter()) {
                    self.bind_pattern(item, t);
                }
            }
        }
    }

    // -- qualifiers ---------------------------------------------------------

    /// Process one comprehension/`from` qualifier list in order, declaring
    /// each generator/bind's pattern before the next qualifier is
    /// processed (sequential scoping). Returns each generator's source
    /// monoid (for `MaxOfMonoids`) and inner type, in order.
    fn infer_qualifiers(&mut self, qs: &[Qualifier]) -> Vec<(Monoid, Type)> {
        let mut gens = Vec::new();
        for q in qs {
            match q {
                Qualifier::Gen(pat, src) => {
                    let src_ty = self.infer(src);
                    let walked = self.solver.walk(&src_ty);
                    let (m, inner) = match collection_parts(&walked) {
                        Some(parts) => parts,
                        None => {
                            let inner = self.solver.fresh_type_var();
                            let m = self.solver.fresh_monoid_var();
                            let expect = Type::collection(m.clone(), inner.clone());
                            self.unify(&src_ty, &expect, src.span, src.span);
                            (m, inner)
                        }
                    };
                    gens.push((m, inner.clone()));
                    match pat {
                        Some(p) => self.bind_pattern(p, &inner),
                        None => self.bind_anonymous_generator(src, &inner),
                    }
                }
                Qualifier::Bind(p, u) => {
                    let watermark = self.solver.snapshot();
                    let ty = self.infer(u);
                    let scheme = self.solver.generalize(watermark, &ty);
                    self.bind_pattern_scheme(p, &scheme);
                }
                Qualifier::Exp(e) => {
                    let ty = self.infer(e);
                    self.unify(&ty, &Type::Bool, e.span, e.span);
                }
            }
        }
        gens
    }

    /// Like [`Self::bind_pattern`], but records a `TypeScheme` for simple
    /// identifier patterns so later uses instantiate independently
    /// (§4.2 "Let-polymorphism").
    fn bind_pattern_scheme(&mut self, p: &Pattern, scheme: &TypeScheme) {
        match p {
            Pattern::Idn(sym, span) => {
                self.declare_idn(sym, Entity::Variable(sym.clone(), scheme.body.clone()), *span);
                self.schemes.insert(sym.clone(), scheme.clone());
            }
            Pattern::Prod(..) => self.bind_pattern(p, &scheme.body),
        }
    }

    /// `Gen(None, e)` over a record collection injects each field as an
    /// implicit identifier (§3.4 alias environment, §4.2 item 2).
    fn bind_anonymous_generator(&mut self, gen_expr: &Expr, inner: &Type) {
        let walked = self.solver.walk(inner);
        if let Type::Record(atts) = &walked {
            if let RecordAttributes::Attributes(fields) = atts.as_ref() {
                for (idx, f) in fields.iter().enumerate() {
                    let entity = Entity::GenAttribute(f.idn.clone(), gen_expr.clone(), idx);
                    self.envs.alias.declare(f.idn.name(), entity.clone());
                    self.envs.idn.declare(f.idn.name(), entity);
                }
            }
        }
    }

    // -- expressions ----------------------------------------------------------

    fn infer(&mut self, e: &Expr) -> Type {
        let ty = self.infer_kind(e);
        self.record_type(e.id, ty)
    }

    #[allow(clippy::too_many_lines)]
    fn infer_kind(&mut self, e: &Expr) -> Type {
        match &e.kind {
            ExprKind::BoolConst(_) => Type::Bool,
            ExprKind::IntConst(_) => Type::Int,
            ExprKind::FloatConst(_) => Type::Float,
            ExprKind::StringConst(_) => Type::String,

            ExprKind::IdnExp(sym) => {
                let (entity, ty) = self.resolve_idn(sym, e.span);
                self.entities.insert(e.id, entity);
                ty
            }

            ExprKind::RecordProj(inner, field) => {
                let inner_ty = self.infer(inner);
                let field_ty = self.solver.fresh_type_var();
                let attr_sym = self.symbols.fresh("r");
                let expect = Type::record(RecordAttributes::AttributesVariable(
                    vec![Attribute::new(field.clone(), field_ty.clone())],
                    attr_sym,
                ));
                self.unify(&inner_ty, &expect, inner.span, e.span);
                field_ty
            }

            ExprKind::RecordCons(fields) => {
                let atts = fields
                    .iter()
                    .map(|f| Attribute::new(f.idn.clone(), self.infer(&f.value)))
                    .collect();
                Type::record(RecordAttributes::Attributes(atts))
            }

            ExprKind::IfThenElse(c, t, f) => {
                let c_ty = self.infer(c);
                self.unify(&c_ty, &Type::Bool, c.span, e.span);
                let t_ty = self.infer(t);
                let f_ty = self.infer(f);
                self.unify(&t_ty, &f_ty, t.span, f.span)
            }

            ExprKind::BinaryExp(op, l, r) => self.infer_binary(*op, l, r, e.span),

            ExprKind::UnaryExp(op, inner) => self.infer_unary(*op, inner, e.span),

            ExprKind::MergeMonoid(m, l, r) => {
                let l_ty = self.infer(l);
                let r_ty = self.infer(r);
                self.unify(&l_ty, &r_ty, l.span, r.span);
                if m.is_collection() {
                    if let Type::Collection(lm, _) = &self.solver.walk(&l_ty) {
                        let _ = self.solver.unify_monoids(lm, m, e.span);
                    }
                }
                l_ty
            }

            ExprKind::ZeroCollectionMonoid(m) => {
                let inner = self.solver.fresh_type_var();
                Type::collection(m.clone(), inner)
            }

            ExprKind::ConsCollectionMonoid(m, inner) => {
                let inner_ty = self.infer(inner);
                Type::collection(m.clone(), inner_ty)
            }

            ExprKind::MultiCons(m, items) => {
                let mut acc: Option<Type> = None;
                for it in items {
                    let ty = self.infer(it);
                    acc = Some(match acc {
                        None => ty,
                        Some(prev) => self.unify(&prev, &ty, it.span, it.span),
                    });
                }
                let inner = acc.unwrap_or_else(|| self.solver.fresh_type_var());
                Type::collection(m.clone(), inner)
            }

            ExprKind::Comp(m, qs, body) => {
                self.envs.push_scope();
                let gens = self.infer_qualifiers(qs);
                for (gm, _) in &gens {
                    let _ = self.solver.require_leq(gm, m, e.span);
                }
                let body_ty = self.infer(body);
                self.envs.pop_scope();
                if m.is_collection() {
                    Type::collection(m.clone(), body_ty)
                } else {
                    body_ty
                }
            }

            ExprKind::Select(s) => self.infer_select(s, e.span),

            ExprKind::FunAbs(p, body) => {
                self.envs.push_scope();
                let param_ty = self.pattern_fresh_type(p);
                self.bind_pattern(p, &param_ty);
                let body_ty = self.infer(body);
                self.envs.pop_scope();
                Type::fun(param_ty, body_ty)
            }

            ExprKind::FunApp(f, arg) => {
                let f_ty = self.infer(f);
                let arg_ty = self.infer(arg);
                let expected = self.solver.fresh_type_var();
                let out = self.solver.fresh_type_var();
                let expected_fun = Type::fun(expected.clone(), out.clone());
                self.unify(&f_ty, &expected_fun, f.span, arg.span);
                // A tuple-pattern parameter (`\(x, y) -> ...`) expects a
                // `Pattern` type, but a record literal argument carries a
                // `Record` type: adjust by unifying the record's fields
                // positionally against the pattern's component types,
                // matching how `mcalc-canon`'s beta-reduction destructures
                // a `Pattern::Prod` against a record argument by position.
                let expected_walked = self.solver.walk(&expected);
                let arg_walked = self.solver.walk(&arg_ty);
                if let (Type::Pattern(components), Type::Record(atts)) = (&expected_walked, &arg_walked) {
                    if let RecordAttributes::Attributes(fields) = atts.as_ref() {
                        if fields.len() == components.len() {
                            for (field, comp_ty) in fields.iter().zip(components.iter()) {
                                self.unify(&field.ty, comp_ty, arg.span, f.span);
                            }
                            return out;
                        }
                    }
                }
                self.unify(&arg_ty, &expected_walked, arg.span, f.span);
                out
            }

            ExprKind::ExpBlock(binds, body) => {
                self.envs.push_scope();
                for (p, u) in binds {
                    let watermark = self.solver.snapshot();
                    let ty = self.infer(u);
                    let scheme = self.solver.generalize(watermark, &ty);
                    self.bind_pattern_scheme(p, &scheme);
                }
                let body_ty = self.infer(body);
                self.envs.pop_scope();
                body_ty
            }

            ExprKind::Partition => {
                if let Some(entity) = self.envs.partition.lookup("partition").cloned() {
                    self.entities.insert(e.id, entity.clone());
                    entity.ty().unwrap_or(Type::AnyType)
                } else {
                    self.error(CalculusError::UnknownPartition { pos: e.span });
                    Type::AnyType
                }
            }

            ExprKind::Star => {
                if let Some(entity) = self.envs.star.lookup("*").cloned() {
                    self.entities.insert(e.id, entity.clone());
                    entity.ty().unwrap_or(Type::AnyType)
                } else {
                    self.error(CalculusError::UnknownStar { pos: e.span });
                    Type::AnyType
                }
            }

            ExprKind::Into(e1, e2) => {
                let t1 = self.infer(e1);
                self.envs.push_scope();
                let walked = self.solver.walk(&t1);
                if let Type::Record(atts) = &walked {
                    if let RecordAttributes::Attributes(fields) = atts.as_ref() {
                        for (idx, f) in fields.iter().enumerate() {
                            let entity = Entity::IntoAttribute(f.idn.clone(), e1.clone(), idx);
                            self.envs.alias.declare(f.idn.name(), entity.clone());
                            self.envs.idn.declare(f.idn.name(), entity);
                        }
                    }
                }
                let t2 = self.infer(e2);
                self.envs.pop_scope();
                t2
            }

            ExprKind::Sum(inner) | ExprKind::Max(inner) | ExprKind::Min(inner) => {
                let coll_ty = self.infer(inner);
                let elem = self.solver.fresh_type_var();
                let num = Type::NumberType(self.symbols.fresh("n"));
                self.unify(&elem, &num, inner.span, inner.span);
                let expect = Type::collection(self.solver.fresh_monoid_var(), elem.clone());
                self.unify(&coll_ty, &expect, inner.span, e.span);
                self.solver.walk(&elem)
            }

            ExprKind::Avg(inner) => {
                let coll_ty = self.infer(inner);
                let elem = Type::NumberType(self.symbols.fresh("n"));
                let expect = Type::collection(self.solver.fresh_monoid_var(), elem);
                self.unify(&coll_ty, &expect, inner.span, e.span);
                Type::Float
            }

            ExprKind::Count(inner) => {
                let coll_ty = self.infer(inner);
                let elem = self.solver.fresh_type_var();
                let expect = Type::collection(self.solver.fresh_monoid_var(), elem);
                self.unify(&coll_ty, &expect, inner.span, e.span);
                Type::Int
            }

            ExprKind::Exists(inner) => {
                let coll_ty = self.infer(inner);
                let elem = self.solver.fresh_type_var();
                let expect = Type::collection(self.solver.fresh_monoid_var(), elem);
                self.unify(&coll_ty, &expect, inner.span, e.span);
                Type::Bool
            }

            ExprKind::InExp(e1, e2) => {
                let t1 = self.infer(e1);
                let t2 = self.infer(e2);
                let expect = Type::collection(self.solver.fresh_monoid_var(), t1);
                self.unify(&t2, &expect, e1.span, e2.span);
                Type::Bool
            }
        }
    }

    fn pattern_fresh_type(&mut self, p: &Pattern) -> Type {
        match p {
            Pattern::Idn(_, _) => self.solver.fresh_type_var(),
            Pattern::Prod(items, _) => Type::Pattern(items.iter().map(|p| self.pattern_fresh_type(p)).collect()),
        }
    }

    fn infer_binary(&mut self, op: BinaryOp, l: &Expr, r: &Expr, span: Span) -> Type {
        let l_ty = self.infer(l);
        let r_ty = self.infer(r);
        match op {
            BinaryOp::Eq | BinaryOp::Neq => {
                self.unify(&l_ty, &r_ty, l.span, r.span);
                Type::Bool
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.unify(&l_ty, &r_ty, l.span, r.span);
                Type::Bool
            }
            BinaryOp::And | BinaryOp::Or => {
                self.unify(&l_ty, &Type::Bool, l.span, span);
                self.unify(&r_ty, &Type::Bool, r.span, span);
                Type::Bool
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let num = Type::NumberType(self.symbols.fresh("n"));
                self.unify(&l_ty, &num, l.span, span);
                self.unify(&r_ty, &num, r.span, span);
                self.solver.walk(&num)
            }
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, inner: &Expr, span: Span) -> Type {
        let ty = self.infer(inner);
        match op {
            UnaryOp::Neg => {
                let num = Type::NumberType(self.symbols.fresh("n"));
                self.unify(&ty, &num, inner.span, span);
                self.solver.walk(&num)
            }
            UnaryOp::Not => {
                self.unify(&ty, &Type::Bool, inner.span, span);
                Type::Bool
            }
            UnaryOp::ToBag | UnaryOp::ToList => {
                let elem = self.solver.fresh_type_var();
                let expect = Type::collection(self.solver.fresh_monoid_var(), elem.clone());
                self.unify(&ty, &expect, inner.span, span);
                let m = if op == UnaryOp::ToBag { Monoid::Bag } else { Monoid::List };
                Type::collection(m, elem)
            }
        }
    }

    fn infer_select(&mut self, s: &Select, span: Span) -> Type {
        self.envs.push_scope();
        let gens = self.infer_qualifiers(&s.from);
        let gen_inner_types: Vec<Type> = gens.iter().map(|(_, t)| t.clone()).collect();

        if let Some(w) = &s.where_ {
            let wt = self.infer(w);
            self.unify(&wt, &Type::Bool, w.span, span);
        }

        let group_by_present = s.group_by.is_some();
        if let Some(g) = &s.group_by {
            self.infer(g);
        }

        // `*` is defined on every `Select.proj` (§3.4 star environment);
        // `partition` only when `group_by` is present (§3.4 partition
        // environment, §4.2 item 3).
        let star_ty = select_star_type(&s.from, &gen_inner_types, group_by_present, &mut self.solver);
        self.envs.star.declare("*", Entity::Star(s.proj.clone(), star_ty));
        if group_by_present {
            let part_ty = select_partition_type(&s.from, &gen_inner_types, &mut self.solver);
            self.envs
                .partition
                .declare("partition", Entity::Partition(s.proj.clone(), part_ty));
        }

        if self.uses_star_illegally(&s.proj, group_by_present) {
            self.error(CalculusError::IllegalStar { pos: span });
        }

        let proj_ty = self.infer(&s.proj);

        if let Some(h) = &s.having {
            if !group_by_present {
                self.error(CalculusError::UnknownPartition { pos: h.span });
            }
            let ht = self.infer(h);
            self.unify(&ht, &Type::Bool, h.span, span);
        }
        for key in &s.order_by {
            self.infer(&key.expr);
        }

        self.envs.pop_scope();

        let m = if !s.order_by.is_empty() {
            Monoid::List
        } else if s.distinct {
            Monoid::Set
        } else {
            self.solver.fresh_monoid_var()
        };
        Type::collection(m, proj_ty)
    }

    /// `*` combined with other projections and no group-by is an error
    /// (§4.2 `selectStarType`, `IllegalStar`). A conservative syntactic
    /// check: true if `proj` is a `RecordCons` containing a `Star` among
    /// sibling fields while ungrouped.
    fn uses_star_illegally(&self, proj: &Expr, group_by: bool) -> bool {
        if group_by {
            return false;
        }
        if let ExprKind::RecordCons(fields) = &proj.kind {
            if fields.len() > 1 {
                return fields.iter().any(|f| matches!(f.value.kind, ExprKind::Star));
            }
        }
        false
    }
}

/// Promote a `World::sources` entry to the `Collection` a data-source
/// reference resolves to: passed through as-is if it's already a
/// `Collection`, otherwise wrapped as the element of a fresh monoid
/// variable.
fn source_collection_type(t: Type, solver: &mut TypeSolver) -> Type {
    match t {
        Type::Collection(..) => t,
        elem => Type::collection(solver.fresh_monoid_var(), elem),
    }
}

fn collection_parts(ty: &Type) -> Option<(Monoid, Type)> {
    match ty {
        Type::Collection(m, inner) => Some((m.clone(), (**inner).clone())),
        _ => None,
    }
}

fn collection_inner(ty: &Type) -> Option<Type> {
    collection_parts(ty).map(|(_, t)| t)
}

/// Top-level entry point used by `mcalc-driver`.
pub fn analyze(root: &Expr, world: World, symbols: Rc<SymbolGenerator>) -> AnalysisResult {
    Analyzer::new(world, symbols).analyze(root)
}
