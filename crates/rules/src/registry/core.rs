//! Core [`ExtensionRegistry`] struct: module load/unload and capability buckets.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tracing::{info, warn};
use warden_core::ItemKind;
use warden_scheduler::{FireOutcome, JobScheduler, SchedulerConfig, SchedulerError};

use crate::checker::{Capability, Checker};

use super::catalog::ModuleCatalog;
use super::context::{ExtensionContext, StagedJob};
use super::error::{LoadError, LoadResult, LoadStatus};

/// A checker instance contributed by a loaded module.
#[derive(Clone)]
pub struct ExtensionEntry {
    pub module: String,
    pub name: String,
    pub capability: Capability,
    pub instance: Arc<dyn Checker>,
}

impl fmt::Debug for ExtensionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("capability", &self.capability)
            .finish()
    }
}

struct LoadedModule {
    /// Present only when the module registered jobs.
    scheduler: Option<Arc<JobScheduler>>,
    extensions: usize,
}

#[derive(Default)]
struct RegistryState {
    /// Loaded modules in load order.
    modules: IndexMap<String, LoadedModule>,
    post: Vec<ExtensionEntry>,
    comment: Vec<ExtensionEntry>,
}

impl RegistryState {
    fn push(&mut self, entry: ExtensionEntry) {
        match entry.capability {
            Capability::PostOnly => self.post.push(entry),
            Capability::CommentOnly => self.comment.push(entry),
            Capability::Both => {
                self.post.push(entry.clone());
                self.comment.push(entry);
            }
        }
    }
}

/// Loads rule modules from a [`ModuleCatalog`] and keeps their checkers in
/// ordered per-kind buckets.
///
/// `E` is the environment handed to every module's setup (settings and
/// platform handles). Loads and unloads are serialized; bucket reads only
/// take a short read lock and return snapshots.
pub struct ExtensionRegistry<E> {
    catalog: ModuleCatalog<E>,
    env: E,
    scheduler_config: SchedulerConfig,
    /// Serializes load/unload so setup never runs twice for one module.
    load_lock: Mutex<()>,
    state: RwLock<RegistryState>,
}

impl<E> ExtensionRegistry<E> {
    pub fn new(catalog: ModuleCatalog<E>, env: E, scheduler_config: SchedulerConfig) -> Self {
        Self {
            catalog,
            env,
            scheduler_config,
            load_lock: Mutex::new(()),
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn catalog(&self) -> &ModuleCatalog<E> {
        &self.catalog
    }

    /// Load module `name`. Loading an already loaded module is a no-op.
    ///
    /// On any error nothing the module registered is kept and its jobs
    /// never start.
    pub fn load(&self, name: &str) -> Result<LoadStatus, LoadError> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.read_state().modules.contains_key(name) {
            info!(module = %name, "module already loaded");
            return Ok(LoadStatus::AlreadyLoaded);
        }

        let descriptor = self
            .catalog
            .get(name)
            .ok_or_else(|| LoadError::UnknownModule(name.to_string()))?;
        let setup = descriptor
            .setup
            .ok_or_else(|| LoadError::MissingEntryPoint(name.to_string()))?;

        let mut ctx = ExtensionContext::new(name, &self.env);
        setup(&mut ctx).map_err(|source| LoadError::Setup {
            module: name.to_string(),
            source,
        })?;
        let (instances, jobs) = ctx.into_parts();

        let job_count = jobs.len();
        let scheduler = self
            .start_jobs(jobs)
            .map_err(|source| LoadError::Scheduler {
                module: name.to_string(),
                source,
            })?;

        let extensions = instances.len();
        let mut state = self.write_state();
        for instance in instances {
            state.push(entry(name, instance));
        }
        state.modules.insert(
            name.to_string(),
            LoadedModule {
                scheduler,
                extensions,
            },
        );
        drop(state);

        info!(module = %name, extensions, jobs = job_count, "loaded module");
        Ok(LoadStatus::Loaded {
            extensions,
            jobs: job_count,
        })
    }

    /// Load every module in `names` in order. Failures are logged and
    /// reported per module without stopping the rest.
    pub fn load_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<LoadResult> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let status = match self.load(name) {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(module = %name, error = %e, "failed to load module");
                        LoadStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                LoadResult {
                    module: name.to_string(),
                    status,
                }
            })
            .collect()
    }

    /// Unload module `name`: drop its checkers from both buckets and stop
    /// its jobs, waiting for in-flight runs. Returns false if it was not
    /// loaded.
    pub fn unload(&self, name: &str) -> bool {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = {
            let mut state = self.write_state();
            let removed = state.modules.shift_remove(name);
            if removed.is_some() {
                state.post.retain(|e| e.module != name);
                state.comment.retain(|e| e.module != name);
            }
            removed
        };

        let Some(module) = removed else {
            return false;
        };
        // Outside the state lock: stopping waits for running jobs.
        if let Some(scheduler) = module.scheduler {
            scheduler.stop();
        }
        info!(module = %name, extensions = module.extensions, "unloaded module");
        true
    }

    /// Add a checker on behalf of loaded module `module`, dispatching it by
    /// its declared capability. Returns false if `module` is not loaded.
    pub fn add_extension(&self, module: &str, instance: Arc<dyn Checker>) -> bool {
        let mut state = self.write_state();
        match state.modules.get_mut(module) {
            Some(loaded) => loaded.extensions += 1,
            None => return false,
        }
        state.push(entry(module, instance));
        true
    }

    /// Checkers applying to posts, in registration order.
    pub fn post_bucket(&self) -> Vec<Arc<dyn Checker>> {
        self.bucket(ItemKind::Post)
    }

    /// Checkers applying to comments, in registration order.
    pub fn comment_bucket(&self) -> Vec<Arc<dyn Checker>> {
        self.bucket(ItemKind::Comment)
    }

    pub fn bucket(&self, kind: ItemKind) -> Vec<Arc<dyn Checker>> {
        let state = self.read_state();
        let entries = match kind {
            ItemKind::Post => &state.post,
            ItemKind::Comment => &state.comment,
        };
        entries.iter().map(|e| Arc::clone(&e.instance)).collect()
    }

    /// Loaded module names in load order.
    pub fn loaded_modules(&self) -> Vec<String> {
        self.read_state().modules.keys().cloned().collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.read_state().modules.contains_key(name)
    }

    /// Job ids registered by `module`, sorted. Empty if not loaded.
    pub fn module_jobs(&self, module: &str) -> Vec<String> {
        self.scheduler_of(module)
            .map(|s| s.job_ids())
            .unwrap_or_default()
    }

    /// Fire one of `module`'s jobs now, on the calling thread.
    pub fn fire_job(&self, module: &str, job: &str) -> Result<FireOutcome, SchedulerError> {
        let scheduler = self
            .scheduler_of(module)
            .ok_or_else(|| SchedulerError::UnknownJob(format!("{}/{}", module, job)))?;
        scheduler.fire(job)
    }

    /// Unload every module, most recently loaded first.
    pub fn shutdown(&self) {
        for name in self.loaded_modules().iter().rev() {
            self.unload(name);
        }
    }

    pub(super) fn scheduler_of(&self, module: &str) -> Option<Arc<JobScheduler>> {
        self.read_state()
            .modules
            .get(module)
            .and_then(|m| m.scheduler.clone())
    }

    fn start_jobs(&self, jobs: Vec<StagedJob>) -> Result<Option<Arc<JobScheduler>>, SchedulerError> {
        if jobs.is_empty() {
            return Ok(None);
        }
        let scheduler = JobScheduler::new(self.scheduler_config.for_jobs(jobs.len()));
        for job in jobs {
            scheduler.register_job_action(job.id, job.interval, job.action)?;
        }
        scheduler.start()?;
        Ok(Some(Arc::new(scheduler)))
    }

    fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn entry(module: &str, instance: Arc<dyn Checker>) -> ExtensionEntry {
    ExtensionEntry {
        module: module.to_string(),
        name: instance.name().to_string(),
        capability: instance.capability(),
        instance,
    }
}
