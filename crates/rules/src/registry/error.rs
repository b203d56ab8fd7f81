//! Error types and load result structures for the extension registry.

use warden_scheduler::SchedulerError;

/// Errors surfaced by [`load`](super::ExtensionRegistry::load). Registry state
/// is unchanged whenever one is returned.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Module {0} has no setup entry point")]
    MissingEntryPoint(String),

    #[error("Setup of module {module} failed: {source}")]
    Setup {
        module: String,
        #[source]
        source: SetupError,
    },

    #[error("Failed to schedule jobs of module {module}: {source}")]
    Scheduler {
        module: String,
        #[source]
        source: SchedulerError,
    },
}

/// Failure reported by a module's setup entry point.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Duplicate job {0} in module")]
    DuplicateJob(String),
}

/// Outcome of loading a single module by name.
#[derive(Debug)]
pub struct LoadResult {
    pub module: String,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    Loaded { extensions: usize, jobs: usize },
    AlreadyLoaded,
    Failed { error: String },
}
