//! Registry mapping plugin identifiers to factories

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{builtin, PluginCategory, PluginInstance};

/// Builds plugin instances from a directive's arguments.
///
/// A factory may return instances of several categories; lookups keep the
/// ones matching the requested category.
pub type PluginFactory = Arc<dyn Fn(&[String]) -> Vec<PluginInstance> + Send + Sync>;

/// Run-independent plugin lookup service
#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `core.*` plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a factory, returning the one it replaces
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Option<PluginFactory>
    where
        F: Fn(&[String]) -> Vec<PluginInstance> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All instances a directive produces; `None` for an unknown identifier
    pub fn instantiate(&self, name: &str, arguments: &[String]) -> Option<Vec<PluginInstance>> {
        self.factories.get(name).map(|factory| factory(arguments))
    }

    /// Instances of category `P` a directive produces; `None` for an
    /// unknown identifier
    pub fn lookup<P>(&self, name: &str, arguments: &[String]) -> Option<Vec<Arc<P>>>
    where
        P: PluginCategory + ?Sized,
    {
        self.instantiate(name, arguments).map(|instances| {
            instances
                .iter()
                .filter_map(|instance| P::from_instance(instance))
                .collect()
        })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
