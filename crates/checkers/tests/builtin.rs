//! Built-in modules loaded through the registry and run by the rule engine.

use std::io::Write;
use std::sync::Arc;

use chrono::{Duration, Utc};
use warden_checkers::{builtin_catalog, CheckerEnv, Platform, PromotionLookup, RecordingPlatform, StaticLookup};
use warden_core::{CheckerSettings, ModerationItem, Rule};
use warden_rules::{
    ExtensionRegistry, LoadStatus, ModerationSink, Outcome, RecordedAction, RecordingSink, RuleEngine,
};
use warden_scheduler::{FireOutcome, SchedulerConfig};

const SETTINGS: &str = r#"
domains:
  approved: [partner.tv]
  rejected: [spam.example]
  watched: [youtube.com, partner.tv]
flair:
  warn_after_secs: 60
  remove_after_secs: 120
  sweep_interval_secs: 3600
highlight:
  author_classes: [staff]
promotion:
  comment_limit: 5
  time_limit_secs: 300
all:
  communities: [rust]
  interval_secs: 3600
"#;

const LONG_VIDEO: &str = "https://youtube.com/watch?v=long";

struct Harness {
    registry: ExtensionRegistry<CheckerEnv>,
    engine: RuleEngine<Arc<RecordingSink>>,
    sink: Arc<RecordingSink>,
    platform: Arc<RecordingPlatform>,
}

fn harness() -> Harness {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SETTINGS.as_bytes()).unwrap();
    let settings = CheckerSettings::from_file(file.path()).unwrap();

    let sink = Arc::new(RecordingSink::new());
    let platform = Arc::new(RecordingPlatform::new());
    let lookup = StaticLookup::new()
        .with_comments("newcomer", 1)
        .with_comments("regular", 40)
        .with_video(LONG_VIDEO, std::time::Duration::from_secs(1200));
    let env = CheckerEnv::new(
        settings,
        Arc::clone(&sink) as Arc<dyn ModerationSink>,
        Arc::clone(&platform) as Arc<dyn Platform>,
        Arc::new(lookup) as Arc<dyn PromotionLookup>,
    );
    let registry = ExtensionRegistry::new(
        builtin_catalog(),
        env,
        SchedulerConfig::with_worker_threads(1),
    );
    let engine = RuleEngine::new(Arc::clone(&sink));
    Harness {
        registry,
        engine,
        sink,
        platform,
    }
}

#[test]
fn loads_every_builtin_module() {
    let h = harness();
    let results = h
        .registry
        .load_all(&["text", "domain", "promotion", "flair", "highlight", "all"]);
    assert!(results
        .iter()
        .all(|r| matches!(r.status, LoadStatus::Loaded { .. })));

    let post_names: Vec<String> = h.registry.post_bucket().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(post_names, vec!["text", "domain", "promotion", "flair"]);
    assert_eq!(h.registry.comment_bucket().len(), 1);
    assert_eq!(h.registry.module_jobs("flair"), vec!["flair.sweep"]);
    assert_eq!(h.registry.module_jobs("all"), vec!["all.flair"]);
    h.registry.shutdown();
}

#[test]
fn text_post_is_approved_once() {
    let h = harness();
    h.registry.load_all(&["text", "domain", "flair"]);

    let post = ModerationItem::post("p1", "alice", Utc::now()).self_post().with_flair("Talk");
    assert_eq!(h.engine.process(&post, &h.registry.post_bucket()), Outcome::Approved);
    assert_eq!(h.sink.actions(), vec![RecordedAction::Approved("p1".to_string())]);
    h.registry.shutdown();
}

#[test]
fn rejected_domain_pre_empts_flair_tracking() {
    let h = harness();
    h.registry.load_all(&["domain", "flair"]);

    let post = ModerationItem::post("p1", "alice", Utc::now()).with_url("https://spam.example/buy");
    assert_eq!(
        h.engine.process(&post, &h.registry.post_bucket()),
        Outcome::Removed(Some(Rule::Domain))
    );

    // Flair never saw the post, so the sweep has nothing to do.
    h.registry.fire_job("flair", "flair.sweep").unwrap();
    assert_eq!(h.sink.removals(), 1);
    h.registry.shutdown();
}

#[test]
fn flair_sweep_job_removes_overdue_post() {
    let h = harness();
    h.registry.load("flair").unwrap();

    let post = ModerationItem::post("p1", "alice", Utc::now() - Duration::minutes(10));
    assert_eq!(h.engine.process(&post, &h.registry.post_bucket()), Outcome::Untouched);

    assert_eq!(
        h.registry.fire_job("flair", "flair.sweep").unwrap(),
        FireOutcome::Executed { runs: 1 }
    );
    assert_eq!(
        h.sink.actions(),
        vec![RecordedAction::Removed("p1".to_string(), Some(Rule::Flair))]
    );
    h.registry.shutdown();
}

#[test]
fn reloaded_flair_module_starts_empty() {
    let h = harness();
    h.registry.load("flair").unwrap();
    let post = ModerationItem::post("p1", "alice", Utc::now() - Duration::minutes(10));
    h.engine.process(&post, &h.registry.post_bucket());

    assert!(h.registry.unload("flair"));
    h.registry.load("flair").unwrap();

    h.registry.fire_job("flair", "flair.sweep").unwrap();
    assert!(h.sink.actions().is_empty());
    h.registry.shutdown();
}

#[test]
fn highlight_comment_is_left_for_others() {
    let h = harness();
    h.registry.load("highlight").unwrap();

    let comment = ModerationItem::comment("c1", "p1", "dev", Utc::now()).with_author_flair_class("Staff");
    assert_eq!(
        h.engine.process(&comment, &h.registry.comment_bucket()),
        Outcome::Untouched
    );
    assert_eq!(h.platform.stickies().len(), 1);
    assert!(h.sink.actions().is_empty());
}

#[test]
fn promotion_leaves_established_author_for_manual_review() {
    let h = harness();
    h.registry.load_all(&["domain", "promotion", "flair"]);

    let post = ModerationItem::post("p1", "regular", Utc::now())
        .with_url(LONG_VIDEO)
        .with_flair("Video");
    assert_eq!(
        h.engine.process(&post, &h.registry.post_bucket()),
        Outcome::AwaitingManual
    );
    assert!(h.sink.actions().is_empty());
    h.registry.shutdown();
}

#[test]
fn promotion_removes_newcomer_long_video() {
    let h = harness();
    h.registry.load_all(&["domain", "promotion", "flair"]);

    let post = ModerationItem::post("p1", "newcomer", Utc::now()).with_url(LONG_VIDEO);
    assert_eq!(
        h.engine.process(&post, &h.registry.post_bucket()),
        Outcome::Removed(Some(Rule::Promotion))
    );
    assert_eq!(
        h.sink.actions(),
        vec![RecordedAction::Removed("p1".to_string(), Some(Rule::Promotion))]
    );
    h.registry.shutdown();
}

#[test]
fn promotion_without_watched_hosts_fails_to_load() {
    let h = harness();
    let mut settings = h.registry.env().settings.clone();
    settings.domains.watched.clear();
    let env = CheckerEnv { settings, ..h.registry.env().clone() };
    let registry = ExtensionRegistry::new(builtin_catalog(), env, SchedulerConfig::with_worker_threads(1));

    assert!(registry.load("promotion").is_err());
    assert!(!registry.is_loaded("promotion"));
}

#[test]
fn all_job_flairs_hot_posts_from_the_community() {
    let h = harness();
    h.registry.load("all").unwrap();
    h.platform.set_hot(vec![
        ModerationItem::post("p1", "alice", Utc::now()).in_community("Rust"),
        ModerationItem::post("p2", "bob", Utc::now()).in_community("pics"),
    ]);

    assert_eq!(
        h.registry.fire_job("all", "all.flair").unwrap(),
        FireOutcome::Executed { runs: 1 }
    );
    assert_eq!(h.platform.flairs(), vec![("p1".to_string(), "r/all".to_string())]);
    h.registry.shutdown();
}
