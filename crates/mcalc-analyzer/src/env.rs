//! The four environment chains (§3.4, §4.2 "Environment chains"), each a
//! stack of scopes pushed/popped around the scoping constructs that
//! introduce them (`Comp`, `ExpBlock`, `Select`, `FunAbs`).

use mcalc_ast::Entity;
use rustc_hash::FxHashMap;

/// One nesting level of a chain. `MultipleEntity` handling lives here:
/// [`Scope::declare`] returns the prior entity when a name is redeclared so
/// the caller can mark both as `Multiple` (§3.4 "Shadowing rule").
#[derive(Debug, Default)]
pub struct Scope {
    bindings: FxHashMap<String, Entity>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` in this scope. Returns `Some(previous)` if `name` was
    /// already declared in *this* scope (shadowing within the same scope,
    /// not across scopes, is what triggers `Multiple`).
    pub fn declare(&mut self, name: String, entity: Entity) -> Option<Entity> {
        self.bindings.insert(name, entity)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.bindings.get(name)
    }
}

/// A stack of [`Scope`]s, innermost last. Lookup walks from the top down;
/// the first hit wins (standard lexical shadowing across distinct scopes).
#[derive(Debug, Default)]
pub struct Chain {
    scopes: Vec<Scope>,
}

impl Chain {
    #[must_use]
    pub fn new() -> Self {
        Chain { scopes: vec![Scope::new()] }
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Declare in the innermost scope, reporting a `Multiple` collision if
    /// `name` was already bound there.
    pub fn declare(&mut self, name: &str, entity: Entity) -> bool {
        let scope = self.scopes.last_mut().expect("chain always has a scope");
        scope.declare(name.to_string(), entity).is_some()
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Entity> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }
}

/// The four chains (§4.2): identifier resolution, the alias environment
/// (implicit record-field injection), the partition environment (`partition`
/// only visible in a group-by `Select.proj`), and the star environment (`*`
/// visible in any `Select.proj`).
#[derive(Debug, Default)]
pub struct Environments {
    pub idn: Chain,
    pub alias: Chain,
    pub partition: Chain,
    pub star: Chain,
}

impl Environments {
    #[must_use]
    pub fn new() -> Self {
        Environments {
            idn: Chain::new(),
            alias: Chain::new(),
            partition: Chain::new(),
            star: Chain::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.idn.push();
        self.alias.push();
        self.partition.push();
        self.star.push();
    }

    pub fn pop_scope(&mut self) {
        self.idn.pop();
        self.alias.pop();
        self.partition.pop();
        self.star.pop();
    }
}
