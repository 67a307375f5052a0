//! An explicit registry mapping delegation tokens to programs.
//!
//! The original design kept submachines in process-wide mutable state. Here
//! the registry is a plain value: build it once before any run, wrap it in
//! an [`Arc`], and hand it to every machine that needs it. During execution
//! it is read-only, so sharing it across engines (or threads hosting
//! independent engines) needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Program;

/// Token to program bindings consulted when a transition's action is
/// [`Action::Call`](crate::types::Action::Call).
///
/// A machine resolves a token against its program's local bindings first and
/// falls back to this shared registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    bindings: HashMap<String, Arc<Program>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `token` to `program`, returning the previous binding if the
    /// token was already registered.
    pub fn register(&mut self, token: &str, program: Arc<Program>) -> Option<Arc<Program>> {
        self.bindings.insert(token.to_string(), program)
    }

    /// Resolves a delegation token.
    pub fn get(&self, token: &str) -> Option<&Arc<Program>> {
        self.bindings.get(token)
    }

    /// Whether `token` has a binding.
    pub fn contains(&self, token: &str) -> bool {
        self.bindings.contains_key(token)
    }

    /// Iterates over the registered tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Freezes the registry for sharing across machines.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransitionTable;

    fn dummy_program(name: &str) -> Arc<Program> {
        Arc::new(Program {
            name: name.to_string(),
            initial_state: "s0".to_string(),
            final_states: vec!["s1".to_string()],
            tape: String::new(),
            blank: ' ',
            rules: TransitionTable::new(Vec::new()).unwrap(),
            submachines: HashMap::new(),
        })
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.register("I", dummy_program("Increment"));
        registry.register("D", dummy_program("Decrement"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("I"));
        assert_eq!(registry.get("D").unwrap().name, "Decrement");
        assert!(registry.get("X").is_none());
    }

    #[test]
    fn test_register_returns_previous_binding() {
        let mut registry = Registry::new();

        assert!(registry.register("S", dummy_program("Adder")).is_none());
        let previous = registry.register("S", dummy_program("Adder v2")).unwrap();

        assert_eq!(previous.name, "Adder");
        assert_eq!(registry.get("S").unwrap().name, "Adder v2");
    }

    #[test]
    fn test_shared_registry_resolves_after_freeze() {
        let mut registry = Registry::new();
        registry.register("S", dummy_program("Adder"));

        let shared = registry.into_shared();
        let other = Arc::clone(&shared);

        assert_eq!(other.get("S").unwrap().name, "Adder");
    }
}
