//! Value environment with a scope stack.
//!
//! The environment maps names to the types of the values they are bound to.
//! Entering a block, function body, loop body or match arm pushes a scope;
//! leaving pops it. Lookup searches from the innermost scope outward. The
//! bottom scope holds module-level declarations and is never popped.

use rustc_hash::FxHashMap;

use crate::ty::Type;

pub struct TypeEnv {
    /// Index 0 is the module scope.
    scopes: Vec<FxHashMap<String, Type>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the innermost scope. The module scope is kept.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings.
    pub fn define(&mut self, name: impl Into<String>, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), ty);
        }
    }

    /// Bind `name` in the module scope.
    pub fn define_global(&mut self, name: impl Into<String>, ty: Type) {
        if let Some(scope) = self.scopes.first_mut() {
            scope.insert(name.into(), ty);
        }
    }

    /// Update the nearest existing binding of `name`. Returns `false` when
    /// no scope binds it.
    pub fn assign(&mut self, name: &str, ty: Type) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = ty;
                return true;
            }
        }
        false
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_global(&self, name: &str) -> Option<&Type> {
        self.scopes.first().and_then(|scope| scope.get(name))
    }

    /// Whether the innermost scope binds `name`.
    pub fn defined_in_current(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains_key(name))
    }

    /// Module-scope bindings in name order.
    pub fn globals(&self) -> Vec<(&str, &Type)> {
        let mut out: Vec<_> = self
            .scopes
            .first()
            .map(|scope| scope.iter().map(|(name, ty)| (name.as_str(), ty)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scopes_shadow_and_pop() {
        let mut env = TypeEnv::new();
        env.define("x", Type::i32());
        env.push_scope();
        env.define("x", Type::string());
        assert_eq!(env.lookup("x"), Some(&Type::string()));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&Type::i32()));
    }

    #[test]
    fn assign_updates_nearest_binding() {
        let mut env = TypeEnv::new();
        env.define("x", Type::i32());
        env.push_scope();
        assert!(env.assign("x", Type::bool()));
        assert!(!env.assign("missing", Type::bool()));
        assert!(!env.defined_in_current("x"));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&Type::bool()));
    }

    #[test]
    fn module_scope_survives_extra_pops() {
        let mut env = TypeEnv::new();
        env.define("answer", Type::i32());
        env.pop_scope();
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert_eq!(env.lookup_global("answer"), Some(&Type::i32()));
    }
}
