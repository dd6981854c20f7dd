//! Scoped variable environment for the typy evaluator.

use crate::error::{EvalError, EvalResult};
use crate::heap::ObjectId;
use crate::value::Value;
use std::collections::BTreeMap;

/// Index of a scope in the environment's scope stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// A single scope level.
#[derive(Debug, Clone)]
struct Scope {
    bindings: BTreeMap<String, Value>,
    /// The scope the running code was defined in.
    parent: Option<ScopeId>,
}

impl Scope {
    fn new(parent: Option<ScopeId>) -> Self {
        Self {
            bindings: BTreeMap::new(),
            parent,
        }
    }
}

/// Module scope plus one scope per active call.
///
/// Lookups walk from the current scope through its *defining* scope chain,
/// not through the callers' scopes. `set` never reaches past the current
/// scope: assigning to a name not bound locally creates a local binding.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// The module scope, live for the whole run.
    pub const MODULE: ScopeId = ScopeId(0);

    /// Create a new environment with only the module scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
        }
    }

    /// The innermost active scope.
    pub fn current(&self) -> ScopeId {
        ScopeId(self.scopes.len() - 1)
    }

    /// Number of active call scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Enter a call whose body was defined in `parent`.
    pub fn push_call_scope(&mut self, parent: ScopeId) {
        self.scopes.push(Scope::new(Some(parent)));
    }

    /// Leave the innermost call scope. The module scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        let idx = self.scopes.len() - 1;
        &mut self.scopes[idx]
    }

    /// Bind `name` in the current scope, shadowing outer bindings.
    pub fn define(&mut self, name: &str, value: Value) {
        self.current_scope_mut()
            .bindings
            .insert(name.to_string(), value);
    }

    /// Look up `name` from the current scope outward along defining scopes.
    pub fn get(&self, name: &str) -> EvalResult<&Value> {
        let mut cursor = Some(self.current());
        while let Some(ScopeId(idx)) = cursor {
            let scope = &self.scopes[idx];
            if let Some(v) = scope.bindings.get(name) {
                return Ok(v);
            }
            cursor = scope.parent;
        }
        Err(EvalError::NameError(format!("name '{name}' is not defined")))
    }

    /// Assign `name` in the current scope.
    pub fn set(&mut self, name: &str, value: Value) {
        self.define(name, value);
    }

    /// All bindings of the module scope.
    pub fn global_bindings(&self) -> &BTreeMap<String, Value> {
        &self.scopes[0].bindings
    }

    /// Every object handle held by a binding in any active scope.
    pub fn object_roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.scopes
            .iter()
            .flat_map(|s| s.bindings.values())
            .filter_map(|v| match v {
                Value::Object(id) => Some(*id),
                _ => None,
            })
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get_in_module_scope() {
        let mut env = Environment::new();
        env.define("a", Value::int(128));
        assert_eq!(env.get("a").unwrap(), &Value::int(128));
        assert!(matches!(env.get("b"), Err(EvalError::NameError(_))));
    }

    #[test]
    fn call_scope_reads_through_to_module() {
        let mut env = Environment::new();
        env.define("a", Value::int(1));
        env.push_call_scope(Environment::MODULE);
        assert_eq!(env.get("a").unwrap(), &Value::int(1));
        assert_eq!(env.depth(), 1);
        env.pop_scope();
        assert_eq!(env.depth(), 0);
    }

    #[test]
    fn set_is_local_by_default() {
        let mut env = Environment::new();
        env.define("a", Value::int(128));
        env.push_call_scope(Environment::MODULE);
        env.set("a", Value::int(5));
        assert_eq!(env.get("a").unwrap(), &Value::int(5));
        env.pop_scope();
        assert_eq!(env.get("a").unwrap(), &Value::int(128));
    }

    #[test]
    fn lookup_skips_caller_scopes() {
        let mut env = Environment::new();
        env.define("a", Value::int(128));
        // caller has a local `a`
        env.push_call_scope(Environment::MODULE);
        env.define("a", Value::int(100));
        // callee defined at module level
        env.push_call_scope(Environment::MODULE);
        assert_eq!(env.get("a").unwrap(), &Value::int(128));
    }

    #[test]
    fn pop_never_removes_module_scope() {
        let mut env = Environment::new();
        env.define("x", Value::None);
        env.pop_scope();
        env.pop_scope();
        assert_eq!(env.get("x").unwrap(), &Value::None);
        assert_eq!(env.current(), Environment::MODULE);
    }

    #[test]
    fn roots_cover_all_active_scopes() {
        let mut env = Environment::new();
        env.define("g", Value::Object(ObjectId::from_raw(0)));
        env.push_call_scope(Environment::MODULE);
        env.define("l", Value::Object(ObjectId::from_raw(1)));
        env.define("n", Value::int(3));
        let mut roots: Vec<_> = env.object_roots().map(ObjectId::index).collect();
        roots.sort();
        assert_eq!(roots, vec![0, 1]);
    }
}
