//! warden: moderation bot.
//!
//! Loads the configured rule modules, starts their periodic jobs, and runs
//! one stream loop per item feed until the feeds are drained or a shutdown
//! signal arrives. Approvals and removals are logged, not applied.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use warden_bot::{DryRunPlatform, DryRunSink, FeedError, JsonLinesFeed, StreamLoop, StreamOptions, StreamStats};
use warden_checkers::{builtin_catalog, CheckerEnv, Platform, PromotionLookup};
use warden_core::config::{load_dotenv, parse_list};
use warden_core::{Config, ItemKind};
use warden_rules::{ExtensionRegistry, LoadStatus, ModerationSink, RuleEngine};
use warden_scheduler::SchedulerConfig;

// ── CLI ─────────────────────────────────────────────────────────────

/// Moderation bot: rule chains over post and comment feeds.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about)]
struct Cli {
    /// JSON-lines file with posts, one item per line.
    #[arg(long, env = "WARDEN_POSTS_FEED")]
    posts: Option<PathBuf>,

    /// JSON-lines file with comments, one item per line.
    #[arg(long, env = "WARDEN_COMMENTS_FEED")]
    comments: Option<PathBuf>,

    /// Checker settings YAML (overrides WARDEN_CHECKERS_FILE).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated modules to load (overrides WARDEN_MODULES).
    #[arg(long)]
    modules: Option<String>,

    /// Exit once every feed is drained instead of waiting for a signal.
    #[arg(long, default_value_t = false)]
    exit_when_drained: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.config {
            config.checkers_file = Some(path.clone());
        }
        if let Some(modules) = &self.modules {
            config.modules = parse_list(modules);
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

type Registry = ExtensionRegistry<CheckerEnv>;
type Engine = RuleEngine<Arc<dyn ModerationSink>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let mut config = Config::from_env();
    let cli = Cli::parse();
    cli.apply(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();
    config.log_summary();

    let settings = config.load_checker_settings()?;
    let dry_run = Arc::new(DryRunSink::new(config.comment_reason));
    let sink: Arc<dyn ModerationSink> = Arc::clone(&dry_run) as Arc<dyn ModerationSink>;
    let platform = Arc::new(DryRunPlatform::new());
    let env = CheckerEnv::new(
        settings,
        Arc::clone(&sink),
        Arc::clone(&platform) as Arc<dyn Platform>,
        platform as Arc<dyn PromotionLookup>,
    );

    let registry = Arc::new(Registry::new(
        builtin_catalog(),
        env,
        SchedulerConfig::with_worker_threads(config.worker_threads),
    ));
    for result in registry.load_all(&config.modules) {
        match result.status {
            LoadStatus::Loaded { extensions, jobs } => {
                info!(module = %result.module, extensions, jobs, "module ready")
            }
            LoadStatus::AlreadyLoaded => {}
            LoadStatus::Failed { error } => warn!(
                module = %result.module,
                error = %error,
                available = %registry.catalog().names().join(","),
                "module skipped"
            ),
        }
    }
    if registry.loaded_modules().is_empty() {
        warn!("no rule modules loaded, every item will be left untouched");
    }

    let engine: Arc<Engine> = Arc::new(RuleEngine::new(sink));
    let stop = Arc::new(AtomicBool::new(false));
    let options = StreamOptions {
        dedup_capacity: config.dedup_capacity,
        skip_before: config.skip_backlog.then(Utc::now),
    };

    let mut streams = Vec::new();
    for (kind, path) in [(ItemKind::Post, &cli.posts), (ItemKind::Comment, &cli.comments)] {
        if let Some(path) = path {
            let feed = JsonLinesFeed::open(path)?;
            let stream = StreamLoop::new(
                kind,
                feed,
                Arc::clone(&registry),
                Arc::clone(&engine),
                options.clone(),
                Arc::clone(&stop),
            );
            streams.push(spawn_stream(kind, stream));
        }
    }
    if streams.is_empty() {
        warn!("no item feeds given, only periodic jobs will run");
    }

    let mut drained = tokio::spawn(join_streams(streams));
    tokio::select! {
        _ = &mut drained, if cli.exit_when_drained => {
            info!("all feeds drained");
        }
        _ = os_signal() => {
            info!("shutdown requested");
        }
    }

    stop.store(true, Ordering::SeqCst);
    if !drained.is_finished() {
        let _ = drained.await;
    }

    // Stops module jobs, waiting for in-flight runs.
    let shutdown_registry = Arc::clone(&registry);
    tokio::task::spawn_blocking(move || shutdown_registry.shutdown()).await?;
    info!(
        approved = dry_run.approved(),
        removed = dry_run.removed(),
        reasons = dry_run.reasons(),
        "warden exited cleanly"
    );
    Ok(())
}

fn spawn_stream(
    kind: ItemKind,
    stream: StreamLoop<JsonLinesFeed<std::io::BufReader<std::fs::File>>, Arc<dyn ModerationSink>, CheckerEnv>,
) -> (ItemKind, JoinHandle<Result<StreamStats, FeedError>>) {
    (kind, tokio::task::spawn_blocking(move || stream.run()))
}

async fn join_streams(streams: Vec<(ItemKind, JoinHandle<Result<StreamStats, FeedError>>)>) {
    for (kind, handle) in streams {
        match handle.await {
            Ok(Ok(stats)) => info!(
                kind = %kind,
                received = stats.received,
                malformed = stats.malformed,
                skipped = stats.skipped,
                approved = stats.approved,
                removed = stats.removed,
                manual = stats.awaiting_manual,
                failed = stats.failed,
                "stream finished"
            ),
            Ok(Err(e)) => error!(kind = %kind, error = %e, "stream ended with feed error"),
            Err(e) => error!(kind = %kind, error = %e, "stream task panicked"),
        }
    }
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C elsewhere.
async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "failed to register signal handlers, falling back to ctrl_c");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "failed to listen for ctrl_c");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl_c");
        }
    }
}
