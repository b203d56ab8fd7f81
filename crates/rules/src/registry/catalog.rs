//! Compile-time catalog of loadable modules.

use std::collections::HashMap;

use super::context::ExtensionContext;
use super::error::SetupError;

/// Module bootstrap entry point: registers the module's checkers and jobs.
pub type SetupFn<E> = fn(&mut ExtensionContext<'_, E>) -> Result<(), SetupError>;

/// A named module. `setup` is `None` for a module that exposes no entry point.
pub struct ModuleDescriptor<E> {
    pub name: String,
    pub setup: Option<SetupFn<E>>,
}

/// Named modules available to an [`ExtensionRegistry`](super::ExtensionRegistry).
pub struct ModuleCatalog<E> {
    modules: HashMap<String, ModuleDescriptor<E>>,
}

impl<E> ModuleCatalog<E> {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Add a module with a setup entry point, replacing any of the same name.
    pub fn with_module(mut self, name: impl Into<String>, setup: SetupFn<E>) -> Self {
        self.insert(name.into(), Some(setup));
        self
    }

    /// Add a module that lacks a setup entry point. Loading it always fails.
    pub fn with_bare_module(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), None);
        self
    }

    fn insert(&mut self, name: String, setup: Option<SetupFn<E>>) {
        self.modules
            .insert(name.clone(), ModuleDescriptor { name, setup });
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor<E>> {
        self.modules.get(name)
    }

    /// Module names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<E> Default for ModuleCatalog<E> {
    fn default() -> Self {
        Self::new()
    }
}
