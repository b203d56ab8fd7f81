//! Rule-checker extensions and the rule chain that turns their verdicts
//! into one moderation action.
//!
//! This crate provides:
//! - The [`Checker`] capability interface and the [`ModerationSink`] it acts through
//! - An extension registry loading named modules from a compile-time catalog
//!   and bucketing their checkers by capability
//! - The rule engine aggregating an ordered bucket of verdicts

pub mod checker;
pub mod engine;
pub mod registry;
pub mod sink;

pub use checker::{Capability, Checker, UnknownCapability};
pub use engine::{EngineError, Outcome, RuleEngine};
pub use registry::{
    ExtensionContext, ExtensionEntry, ExtensionRegistry, LoadError, LoadResult, LoadStatus,
    ModuleCatalog, SetupError, SetupFn,
};
pub use sink::{ModerationSink, RecordedAction, RecordingSink};
