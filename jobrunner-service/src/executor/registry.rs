//! Executor registry
//!
//! Maps payload kinds to their registered executors. Submissions with a
//! kind that has no registered executor are rejected before anything is
//! written to the store.

use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::{CommandExecutor, PayloadExecutor, SleepExecutor};

/// Registry of payload executors keyed by kind
pub struct ExecutorRegistry {
    executors: HashMap<&'static str, Arc<dyn PayloadExecutor>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in executors registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CommandExecutor::new()));
        registry.register(Arc::new(SleepExecutor::new()));
        registry
    }

    /// Registers an executor under its declared kind
    ///
    /// Registering a second executor for the same kind replaces the first.
    pub fn register(&mut self, executor: Arc<dyn PayloadExecutor>) {
        self.executors.insert(executor.kind(), executor);
    }

    /// Looks up the executor for a payload kind
    pub fn get(&self, kind: &str) -> Option<Arc<dyn PayloadExecutor>> {
        self.executors.get(kind).cloned()
    }

    /// All registered payload kinds, sorted
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.executors.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ExecutorRegistry::with_builtins();

        assert!(registry.get("command").is_some());
        assert!(registry.get("sleep").is_some());
        assert_eq!(registry.kinds(), vec!["command", "sleep"]);
    }

    #[test]
    fn test_unknown_kind_is_absent() {
        let registry = ExecutorRegistry::with_builtins();
        assert!(registry.get("no-such-kind").is_none());
    }
}
