//! Extension registry: loads named rule modules and buckets their checkers
//! by capability.
//!
//! Modules come from a compile-time [`ModuleCatalog`]. Loading a module runs
//! its setup entry point against a staging [`ExtensionContext`]; checkers
//! and periodic jobs registered there are committed only if setup succeeds.
//! Each module's jobs run on a scheduler owned by that module, started on
//! load and stopped on unload.

mod catalog;
mod context;
mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::catalog::{ModuleCatalog, ModuleDescriptor, SetupFn};
pub use self::context::ExtensionContext;
pub use self::core::{ExtensionEntry, ExtensionRegistry};
pub use self::error::{LoadError, LoadResult, LoadStatus, SetupError};
