use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ── Process config ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extension modules to load at startup, in load order.
    pub modules: Vec<String>,
    pub log_level: String,
    /// Worker threads backing job executions. 0 = available parallelism.
    pub worker_threads: usize,
    /// Size of the per-stream "already seen" window.
    pub dedup_capacity: usize,
    /// Ignore items created before the process started.
    pub skip_backlog: bool,
    /// YAML file with checker settings.
    pub checkers_file: Option<PathBuf>,
    /// Reply with the broken rule when removing a comment. Posts always
    /// get the reply.
    pub comment_reason: bool,
}

pub const DEFAULT_MODULES: &str = "text,domain,flair";

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            modules: parse_list(&env_or("WARDEN_MODULES", DEFAULT_MODULES)),
            log_level: env_or("WARDEN_LOG_LEVEL", "info"),
            worker_threads: env_usize("WARDEN_WORKER_THREADS", 20),
            dedup_capacity: env_usize("WARDEN_DEDUP_CAPACITY", 1000),
            skip_backlog: env_bool("WARDEN_SKIP_BACKLOG", true),
            checkers_file: env_opt("WARDEN_CHECKERS_FILE").map(PathBuf::from),
            comment_reason: env_bool("WARDEN_COMMENT_REASON", false),
        }
    }

    /// Checker settings from `checkers_file`, or defaults when none is set.
    pub fn load_checker_settings(&self) -> Result<CheckerSettings, ConfigError> {
        match &self.checkers_file {
            Some(path) => CheckerSettings::from_file(path),
            None => Ok(CheckerSettings::default()),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  modules:     {}", self.modules.join(","));
        tracing::info!("  scheduler:   worker_threads={}", self.worker_threads);
        tracing::info!(
            "  streams:     dedup_capacity={}, skip_backlog={}",
            self.dedup_capacity,
            self.skip_backlog
        );
        tracing::info!("  removals:    comment_reason={}", self.comment_reason);
        tracing::info!(
            "  checkers:    file={}",
            self.checkers_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string())
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules: parse_list(DEFAULT_MODULES),
            log_level: "info".to_string(),
            worker_threads: 20,
            dedup_capacity: 1000,
            skip_backlog: true,
            checkers_file: None,
            comment_reason: false,
        }
    }
}

// ── Checker settings (YAML) ───────────────────────────────────

/// Settings consumed by the built-in checkers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerSettings {
    #[serde(default)]
    pub domains: DomainSettings,
    #[serde(default)]
    pub flair: FlairSettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
    #[serde(default)]
    pub promotion: PromotionSettings,
    #[serde(default)]
    pub all: AllSettings,
}

impl CheckerSettings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.flair.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "flair.sweep_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.flair.warn_after_secs > self.flair.remove_after_secs {
            return Err(ConfigError::Invalid {
                key: "flair.warn_after_secs".to_string(),
                reason: "must not exceed remove_after_secs".to_string(),
            });
        }
        if self.highlight.max_links == 0 {
            return Err(ConfigError::Invalid {
                key: "highlight.max_links".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.all.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "all.interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Link domains that decide a post on their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainSettings {
    #[serde(default)]
    pub approved: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
    /// Self-promotion hosts whose posts need an author history check.
    #[serde(default)]
    pub watched: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlairSettings {
    /// Age at which the author of an unflaired post is warned.
    #[serde(default = "default_warn_after")]
    pub warn_after_secs: u64,
    /// Age at which an unflaired post is removed.
    #[serde(default = "default_remove_after")]
    pub remove_after_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Maximum number of unflaired posts tracked at once.
    #[serde(default = "default_flair_capacity")]
    pub capacity: usize,
}

fn default_warn_after() -> u64 { 600 }
fn default_remove_after() -> u64 { 1800 }
fn default_sweep_interval() -> u64 { 60 }
fn default_flair_capacity() -> usize { 1000 }

impl Default for FlairSettings {
    fn default() -> Self {
        Self {
            warn_after_secs: default_warn_after(),
            remove_after_secs: default_remove_after(),
            sweep_interval_secs: default_sweep_interval(),
            capacity: default_flair_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSettings {
    /// Author flair classes whose comments get highlighted (case-insensitive).
    #[serde(default = "default_author_classes")]
    pub author_classes: Vec<String>,
    #[serde(default = "default_highlight_dedup")]
    pub dedup_capacity: usize,
    /// Number of threads whose sticky comment is remembered.
    #[serde(default = "default_anchor_capacity")]
    pub anchor_capacity: usize,
    /// Links listed in one sticky before a new sticky is started.
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

fn default_author_classes() -> Vec<String> { vec!["epic".to_string()] }
fn default_highlight_dedup() -> usize { 200 }
fn default_anchor_capacity() -> usize { 20 }
fn default_max_links() -> usize { 50 }

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            author_classes: default_author_classes(),
            dedup_capacity: default_highlight_dedup(),
            anchor_capacity: default_anchor_capacity(),
            max_links: default_max_links(),
        }
    }
}

/// Self-promotion check for posts linking to watched hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionSettings {
    /// Authors with fewer comments in the community than this are treated
    /// as newcomers.
    #[serde(default = "default_comment_limit")]
    pub comment_limit: u64,
    /// Longest video a newcomer may post.
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: u64,
    /// Hosts whose links are videos with a known duration.
    #[serde(default = "default_video_hosts")]
    pub video_hosts: Vec<String>,
}

fn default_comment_limit() -> u64 { 10 }
fn default_time_limit() -> u64 { 600 }
fn default_video_hosts() -> Vec<String> { vec!["youtube.com".to_string(), "youtu.be".to_string()] }

impl Default for PromotionSettings {
    fn default() -> Self {
        Self {
            comment_limit: default_comment_limit(),
            time_limit_secs: default_time_limit(),
            video_hosts: default_video_hosts(),
        }
    }
}

/// Flairing of the community's posts that reach the front page listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllSettings {
    /// Communities whose posts get flaired (case-insensitive).
    #[serde(default)]
    pub communities: Vec<String>,
    #[serde(default = "default_all_flair")]
    pub flair_text: String,
    /// Posts fetched from the top of the listing per pass.
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
    #[serde(default = "default_all_interval")]
    pub interval_secs: u64,
    /// Number of flaired posts remembered so they are not flaired twice.
    #[serde(default = "default_all_capacity")]
    pub capacity: usize,
}

fn default_all_flair() -> String { "r/all".to_string() }
fn default_listing_limit() -> usize { 25 }
fn default_all_interval() -> u64 { 300 }
fn default_all_capacity() -> usize { 100 }

impl Default for AllSettings {
    fn default() -> Self {
        Self {
            communities: Vec::new(),
            flair_text: default_all_flair(),
            listing_limit: default_listing_limit(),
            interval_secs: default_all_interval(),
            capacity: default_all_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_drops_empty() {
        assert_eq!(parse_list(" text, domain ,,flair "), vec!["text", "domain", "flair"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let settings = CheckerSettings::from_yaml_str(
            r#"
domains:
  approved: [youtube.com]
flair:
  remove_after_secs: 3600
"#,
        )
        .unwrap();

        assert_eq!(settings.domains.approved, vec!["youtube.com"]);
        assert!(settings.domains.rejected.is_empty());
        assert_eq!(settings.flair.remove_after_secs, 3600);
        assert_eq!(settings.flair.warn_after_secs, 600);
        assert_eq!(settings.highlight.anchor_capacity, 20);
        assert_eq!(settings.highlight.author_classes, vec!["epic"]);
        assert_eq!(settings.highlight.max_links, 50);
        assert_eq!(settings.promotion.comment_limit, 10);
        assert_eq!(settings.all.flair_text, "r/all");
    }

    #[test]
    fn promotion_and_all_sections_parse() {
        let settings = CheckerSettings::from_yaml_str(
            r#"
domains:
  watched: [youtube.com, twitch.tv]
promotion:
  comment_limit: 3
  time_limit_secs: 120
all:
  communities: [Rust]
  interval_secs: 30
"#,
        )
        .unwrap();

        assert_eq!(settings.domains.watched, vec!["youtube.com", "twitch.tv"]);
        assert_eq!(settings.promotion.comment_limit, 3);
        assert_eq!(settings.promotion.time_limit_secs, 120);
        assert_eq!(settings.promotion.video_hosts, vec!["youtube.com", "youtu.be"]);
        assert_eq!(settings.all.communities, vec!["Rust"]);
        assert_eq!(settings.all.listing_limit, 25);
    }

    #[test]
    fn zero_max_links_is_rejected() {
        let err = CheckerSettings::from_yaml_str("highlight:\n  max_links: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "highlight.max_links"));
    }

    #[test]
    fn comment_reason_defaults_off() {
        assert!(!Config::default().comment_reason);
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let err = CheckerSettings::from_yaml_str("flair:\n  sweep_interval_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "flair.sweep_interval_secs"));
    }

    #[test]
    fn warn_after_remove_is_rejected() {
        let yaml = "flair:\n  warn_after_secs: 100\n  remove_after_secs: 50\n";
        assert!(CheckerSettings::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("checkers.yml");
        fs::write(&path, "domains:\n  rejected: [spam.example]\n").unwrap();

        let config = Config {
            checkers_file: Some(path),
            ..Config::default()
        };
        let settings = config.load_checker_settings().unwrap();
        assert_eq!(settings.domains.rejected, vec!["spam.example"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CheckerSettings::from_file(Path::new("/nonexistent/warden.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
