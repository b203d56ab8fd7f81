use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use warden_core::{CheckerError, ItemKind, ModerationItem, Verdict};
use warden_scheduler::{FireOutcome, SchedulerConfig};

use super::{ExtensionContext, ExtensionRegistry, LoadError, LoadStatus, ModuleCatalog, SetupError};
use crate::checker::{Capability, Checker};

/// Environment shared with every module setup.
#[derive(Default)]
struct TestEnv {
    constructed: AtomicUsize,
    sweeps: Arc<AtomicUsize>,
}

/// Checker that counts the items it has seen since construction.
struct Counting {
    name: &'static str,
    capability: Capability,
    seen: AtomicUsize,
}

impl Counting {
    fn new(name: &'static str, capability: Capability) -> Arc<Self> {
        Arc::new(Self {
            name,
            capability,
            seen: AtomicUsize::new(0),
        })
    }
}

impl Checker for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    fn evaluate(&self, _item: &ModerationItem) -> Result<Verdict, CheckerError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        // Approves only the first item it ever sees.
        Ok(if seen == 1 { Verdict::approve() } else { Verdict::pass() })
    }
}

fn posts_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.env().constructed.fetch_add(1, Ordering::SeqCst);
    ctx.add_extension(Counting::new("posts", Capability::PostOnly));
    Ok(())
}

fn both_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.add_extension(Counting::new("both", Capability::Both));
    Ok(())
}

fn comments_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.add_extension(Counting::new("comments", Capability::CommentOnly));
    Ok(())
}

fn failing_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.add_extension(Counting::new("half", Capability::Both));
    ctx.register_job("half.job", Duration::from_secs(60), || Ok(()))?;
    Err(SetupError::Settings("missing list".to_string()))
}

fn duplicate_job_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.register_job("dup", Duration::from_secs(60), || Ok(()))?;
    ctx.register_job("dup", Duration::from_secs(60), || Ok(()))?;
    Ok(())
}

fn sweeping_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    let sweeps = Arc::clone(&ctx.env().sweeps);
    ctx.add_extension(Counting::new("sweeper", Capability::PostOnly));
    ctx.register_job("sweeper.sweep", Duration::from_secs(3600), move || {
        sweeps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;
    Ok(())
}

fn two_jobs_setup(ctx: &mut ExtensionContext<'_, TestEnv>) -> Result<(), SetupError> {
    ctx.register_job("pair.first", Duration::from_secs(3600), || Ok(()))?;
    ctx.register_job("pair.second", Duration::from_secs(3600), || Ok(()))?;
    Ok(())
}

fn registry() -> ExtensionRegistry<TestEnv> {
    registry_with(SchedulerConfig::with_worker_threads(1))
}

fn registry_with(scheduler_config: SchedulerConfig) -> ExtensionRegistry<TestEnv> {
    let catalog = ModuleCatalog::new()
        .with_module("posts", posts_setup)
        .with_module("both", both_setup)
        .with_module("comments", comments_setup)
        .with_module("failing", failing_setup)
        .with_module("duplicate_job", duplicate_job_setup)
        .with_module("sweeper", sweeping_setup)
        .with_module("pair", two_jobs_setup)
        .with_bare_module("bare");
    ExtensionRegistry::new(catalog, TestEnv::default(), scheduler_config)
}

fn names(bucket: &[Arc<dyn Checker>]) -> Vec<String> {
    bucket.iter().map(|c| c.name().to_string()).collect()
}

fn post() -> ModerationItem {
    ModerationItem::post("p1", "alice", Utc::now())
}

#[test]
fn load_buckets_by_capability() {
    let registry = registry();
    registry.load("posts").unwrap();
    registry.load("comments").unwrap();
    registry.load("both").unwrap();

    assert_eq!(names(&registry.post_bucket()), vec!["posts", "both"]);
    assert_eq!(names(&registry.comment_bucket()), vec!["comments", "both"]);
    assert_eq!(registry.loaded_modules(), vec!["posts", "comments", "both"]);
}

#[test]
fn both_capability_shares_one_instance() {
    let registry = registry();
    registry.load("both").unwrap();

    let post_side = &registry.post_bucket()[0];
    let comment_side = &registry.comment_bucket()[0];
    assert!(Arc::ptr_eq(post_side, comment_side));
}

#[test]
fn reload_is_a_no_op() {
    let registry = registry();
    assert!(matches!(
        registry.load("posts").unwrap(),
        LoadStatus::Loaded { extensions: 1, jobs: 0 }
    ));
    assert!(matches!(registry.load("posts").unwrap(), LoadStatus::AlreadyLoaded));

    assert_eq!(registry.post_bucket().len(), 1);
    assert_eq!(registry.env().constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn unload_then_load_yields_fresh_instance() {
    let registry = registry();
    registry.load("posts").unwrap();

    let first = registry.post_bucket();
    assert_eq!(first[0].evaluate(&post()).unwrap(), Verdict::approve());
    assert_eq!(first[0].evaluate(&post()).unwrap(), Verdict::pass());

    assert!(registry.unload("posts"));
    assert!(registry.post_bucket().is_empty());
    assert!(registry.comment_bucket().is_empty());
    assert!(!registry.is_loaded("posts"));

    registry.load("posts").unwrap();
    let second = registry.post_bucket();
    assert!(!Arc::ptr_eq(&first[0], &second[0]));
    // Fresh counter: approves its first item again.
    assert_eq!(second[0].evaluate(&post()).unwrap(), Verdict::approve());
    assert_eq!(registry.env().constructed.load(Ordering::SeqCst), 2);
}

#[test]
fn unload_keeps_other_modules() {
    let registry = registry();
    registry.load("posts").unwrap();
    registry.load("both").unwrap();

    assert!(registry.unload("both"));
    assert_eq!(names(&registry.post_bucket()), vec!["posts"]);
    assert!(registry.comment_bucket().is_empty());
}

#[test]
fn unload_unknown_is_a_no_op() {
    let registry = registry();
    registry.load("posts").unwrap();
    assert!(!registry.unload("never"));
    assert_eq!(registry.post_bucket().len(), 1);
}

#[test]
fn missing_entry_point_discards_module() {
    let registry = registry();
    let err = registry.load("bare").unwrap_err();
    assert!(matches!(err, LoadError::MissingEntryPoint(ref m) if m == "bare"));
    assert!(!registry.is_loaded("bare"));
    assert!(registry.loaded_modules().is_empty());
}

#[test]
fn unknown_module_fails() {
    let registry = registry();
    assert!(matches!(
        registry.load("nope"),
        Err(LoadError::UnknownModule(_))
    ));
}

#[test]
fn failed_setup_registers_nothing() {
    let registry = registry();
    let err = registry.load("failing").unwrap_err();
    assert!(matches!(err, LoadError::Setup { .. }));

    assert!(registry.post_bucket().is_empty());
    assert!(registry.comment_bucket().is_empty());
    assert!(!registry.is_loaded("failing"));
    assert!(registry.module_jobs("failing").is_empty());
}

#[test]
fn duplicate_job_in_setup_fails_load() {
    let registry = registry();
    let err = registry.load("duplicate_job").unwrap_err();
    assert!(matches!(
        err,
        LoadError::Setup { source: SetupError::DuplicateJob(ref id), .. } if id == "dup"
    ));
    assert!(!registry.is_loaded("duplicate_job"));
}

#[test]
fn load_all_reports_each_module() {
    let registry = registry();
    let results = registry.load_all(&["posts", "bare", "comments", "posts"]);

    assert_eq!(results.len(), 4);
    assert!(matches!(results[0].status, LoadStatus::Loaded { .. }));
    assert!(matches!(results[1].status, LoadStatus::Failed { .. }));
    assert!(matches!(results[2].status, LoadStatus::Loaded { .. }));
    assert!(matches!(results[3].status, LoadStatus::AlreadyLoaded));
    assert_eq!(registry.loaded_modules(), vec!["posts", "comments"]);
}

#[test]
fn module_jobs_run_until_unload() {
    let registry = registry();
    assert!(matches!(
        registry.load("sweeper").unwrap(),
        LoadStatus::Loaded { extensions: 1, jobs: 1 }
    ));
    assert_eq!(registry.module_jobs("sweeper"), vec!["sweeper.sweep"]);

    assert_eq!(
        registry.fire_job("sweeper", "sweeper.sweep").unwrap(),
        FireOutcome::Executed { runs: 1 }
    );
    assert_eq!(registry.env().sweeps.load(Ordering::SeqCst), 1);

    assert!(registry.unload("sweeper"));
    assert!(registry.fire_job("sweeper", "sweeper.sweep").is_err());

    // Reload registers the same job id again without a collision.
    registry.load("sweeper").unwrap();
    assert_eq!(registry.module_jobs("sweeper"), vec!["sweeper.sweep"]);
    registry.shutdown();
    assert!(registry.loaded_modules().is_empty());
}

#[test]
fn add_extension_requires_loaded_module() {
    let registry = registry();
    assert!(!registry.add_extension("posts", Counting::new("extra", Capability::Both)));

    registry.load("posts").unwrap();
    assert!(registry.add_extension("posts", Counting::new("extra", Capability::Both)));
    assert_eq!(names(&registry.bucket(ItemKind::Post)), vec!["posts", "extra"]);
    assert_eq!(names(&registry.bucket(ItemKind::Comment)), vec!["extra"]);

    registry.unload("posts");
    assert!(registry.bucket(ItemKind::Comment).is_empty());
}

#[test]
fn module_pool_is_sized_to_its_jobs() {
    let registry = registry_with(SchedulerConfig::with_worker_threads(8));
    registry.load_all(&["sweeper", "pair", "posts"]);

    let workers = |module: &str| registry.scheduler_of(module).map(|s| s.config().worker_threads);
    assert_eq!(workers("sweeper"), Some(1));
    assert_eq!(workers("pair"), Some(2));
    assert_eq!(workers("posts"), None);
    registry.shutdown();
}

#[test]
fn module_pool_never_exceeds_configured_workers() {
    let registry = registry();
    registry.load("pair").unwrap();
    assert_eq!(
        registry.scheduler_of("pair").map(|s| s.config().worker_threads),
        Some(1)
    );
    registry.shutdown();
}
