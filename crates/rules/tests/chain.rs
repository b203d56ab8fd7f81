//! Registry buckets feeding the rule engine: registration order decides.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use warden_core::{CheckerError, ModerationItem, Rule, Verdict};
use warden_rules::{
    Capability, Checker, ExtensionContext, ExtensionRegistry, ModuleCatalog, Outcome, RecordedAction,
    RecordingSink, RuleEngine, SetupError,
};
use warden_scheduler::SchedulerConfig;

#[derive(Default)]
struct Env {
    approver_calls: Arc<AtomicUsize>,
}

struct Remover;

impl Checker for Remover {
    fn name(&self) -> &str {
        "remover"
    }

    fn capability(&self) -> Capability {
        Capability::Both
    }

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        if item.author == "spammer" {
            Ok(Verdict::remove(Rule::Custom("spam".to_string())))
        } else {
            Ok(Verdict::pass())
        }
    }
}

struct Approver {
    calls: Arc<AtomicUsize>,
}

impl Checker for Approver {
    fn name(&self) -> &str {
        "approver"
    }

    fn capability(&self) -> Capability {
        Capability::PostOnly
    }

    fn evaluate(&self, _item: &ModerationItem) -> Result<Verdict, CheckerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Verdict::approve())
    }
}

fn remover_setup(ctx: &mut ExtensionContext<'_, Env>) -> Result<(), SetupError> {
    ctx.add_extension(Arc::new(Remover));
    Ok(())
}

fn approver_setup(ctx: &mut ExtensionContext<'_, Env>) -> Result<(), SetupError> {
    let calls = Arc::clone(&ctx.env().approver_calls);
    ctx.add_extension(Arc::new(Approver { calls }));
    Ok(())
}

fn registry() -> ExtensionRegistry<Env> {
    let catalog = ModuleCatalog::new()
        .with_module("remover", remover_setup)
        .with_module("approver", approver_setup);
    ExtensionRegistry::new(catalog, Env::default(), SchedulerConfig::default())
}

#[test]
fn earlier_remover_pre_empts_approver() {
    let registry = registry();
    registry.load_all(&["remover", "approver"]);
    let sink = Arc::new(RecordingSink::new());
    let engine = RuleEngine::new(Arc::clone(&sink));

    let spam = ModerationItem::post("p1", "spammer", Utc::now());
    assert_eq!(
        engine.process(&spam, &registry.post_bucket()),
        Outcome::Removed(Some(Rule::Custom("spam".to_string())))
    );
    assert_eq!(registry.env().approver_calls.load(Ordering::SeqCst), 0);

    let fine = ModerationItem::post("p2", "alice", Utc::now());
    assert_eq!(engine.process(&fine, &registry.post_bucket()), Outcome::Approved);
    assert_eq!(
        sink.actions(),
        vec![
            RecordedAction::Removed("p1".to_string(), Some(Rule::Custom("spam".to_string()))),
            RecordedAction::Approved("p2".to_string()),
        ]
    );
}

#[test]
fn later_remover_still_removes_but_approver_ran_first() {
    let registry = registry();
    registry.load_all(&["approver", "remover"]);
    let sink = Arc::new(RecordingSink::new());
    let engine = RuleEngine::new(Arc::clone(&sink));

    let spam = ModerationItem::post("p1", "spammer", Utc::now());
    assert!(matches!(
        engine.process(&spam, &registry.post_bucket()),
        Outcome::Removed(_)
    ));
    assert_eq!(registry.env().approver_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.approvals(), 0);
}

#[test]
fn comment_bucket_only_holds_comment_capable_checkers() {
    let registry = registry();
    registry.load_all(&["approver", "remover"]);
    let sink = Arc::new(RecordingSink::new());
    let engine = RuleEngine::new(Arc::clone(&sink));

    let comment = ModerationItem::comment("c1", "p1", "alice", Utc::now());
    assert_eq!(engine.process(&comment, &registry.comment_bucket()), Outcome::Untouched);
    assert!(sink.actions().is_empty());
}
