//! Staging area handed to a module's setup entry point.

use std::sync::Arc;
use std::time::Duration;

use warden_scheduler::{JobAction, JobError};

use crate::checker::Checker;

use super::error::SetupError;

pub(super) struct StagedJob {
    pub(super) id: String,
    pub(super) interval: Duration,
    pub(super) action: JobAction,
}

/// Collects what a module registers during setup. Nothing reaches the
/// registry unless setup returns `Ok`.
pub struct ExtensionContext<'a, E> {
    module: &'a str,
    env: &'a E,
    extensions: Vec<Arc<dyn Checker>>,
    jobs: Vec<StagedJob>,
}

impl<'a, E> ExtensionContext<'a, E> {
    pub(super) fn new(module: &'a str, env: &'a E) -> Self {
        Self {
            module,
            env,
            extensions: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub(super) fn into_parts(self) -> (Vec<Arc<dyn Checker>>, Vec<StagedJob>) {
        (self.extensions, self.jobs)
    }

    /// Name of the module being loaded.
    pub fn module(&self) -> &str {
        self.module
    }

    /// Shared environment: settings and platform handles.
    pub fn env(&self) -> &'a E {
        self.env
    }

    /// Register a checker; it lands in the bucket(s) its capability names.
    pub fn add_extension(&mut self, checker: Arc<dyn Checker>) {
        self.extensions.push(checker);
    }

    /// Register a periodic maintenance job owned by this module.
    pub fn register_job<F>(
        &mut self,
        id: impl Into<String>,
        interval: Duration,
        action: F,
    ) -> Result<(), SetupError>
    where
        F: Fn() -> Result<(), JobError> + Send + Sync + 'static,
    {
        let id = id.into();
        if interval.is_zero() {
            return Err(SetupError::Settings(format!("job {} needs a non-zero interval", id)));
        }
        if self.jobs.iter().any(|j| j.id == id) {
            return Err(SetupError::DuplicateJob(id));
        }
        self.jobs.push(StagedJob {
            id,
            interval,
            action: Arc::new(action),
        });
        Ok(())
    }
}
