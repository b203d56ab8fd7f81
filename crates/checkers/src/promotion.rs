//! Self-promotion check for link posts to watched hosts.
//!
//! Approved and rejected hosts decide on sight. Past that, an author with
//! an established comment history is left for a moderator, while a
//! newcomer is approved unless the link is a channel page, a live stream or
//! a video longer than the time limit.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use warden_core::{CheckerError, ModerationItem, PromotionSettings, Rule, Verdict};
use warden_rules::{Capability, Checker, ExtensionContext, SetupError};

use crate::domain::{matches_any, normalize};
use crate::env::CheckerEnv;
use crate::lookup::PromotionLookup;

pub struct PromotionChecker {
    watched: Vec<String>,
    approved: Vec<String>,
    rejected: Vec<String>,
    video_hosts: Vec<String>,
    comment_limit: u64,
    time_limit: Duration,
    lookup: Arc<dyn PromotionLookup>,
}

impl PromotionChecker {
    pub fn new(env: &CheckerEnv) -> Self {
        let domains = &env.settings.domains;
        Self::with_settings(
            &env.settings.promotion,
            &domains.watched,
            &domains.approved,
            &domains.rejected,
            Arc::clone(&env.lookup),
        )
    }

    fn with_settings(
        settings: &PromotionSettings,
        watched: &[String],
        approved: &[String],
        rejected: &[String],
        lookup: Arc<dyn PromotionLookup>,
    ) -> Self {
        Self {
            watched: normalize(watched),
            approved: normalize(approved),
            rejected: normalize(rejected),
            video_hosts: normalize(&settings.video_hosts),
            comment_limit: settings.comment_limit,
            time_limit: Duration::from_secs(settings.time_limit_secs),
            lookup,
        }
    }

    /// Whether a newcomer's link breaks the promotion rule. Only links to
    /// video hosts can.
    fn is_promotional(&self, url: &str, lowered: &str) -> Result<bool, CheckerError> {
        if !matches_any(lowered, &self.video_hosts) {
            return Ok(false);
        }
        if lowered.contains("channel") || lowered.contains("live") {
            return Ok(true);
        }
        let duration = self.lookup.video_duration(url)?;
        Ok(duration > self.time_limit)
    }
}

impl Checker for PromotionChecker {
    fn name(&self) -> &str {
        "promotion"
    }

    fn capability(&self) -> Capability {
        Capability::PostOnly
    }

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        let url = match (&item.url, item.is_self) {
            (Some(url), false) => url,
            _ => return Ok(Verdict::pass()),
        };
        let lowered = url.to_ascii_lowercase();

        if !matches_any(&lowered, &self.watched) {
            return Ok(Verdict::pass());
        }
        if matches_any(&lowered, &self.approved) {
            return Ok(Verdict::approve());
        }
        // Decided here so the outcome does not depend on the domain module.
        if matches_any(&lowered, &self.rejected) {
            return Ok(Verdict::remove(Rule::Domain));
        }

        debug!(item_id = %item.id, "Found watched URL in post");
        let comments = self.lookup.comment_count(&item.author)?;
        if comments >= self.comment_limit {
            return Ok(Verdict::manual());
        }

        if self.is_promotional(url, &lowered)? {
            info!(
                item_id = %item.id,
                author = %item.author,
                comments,
                "Removing video longer than {} seconds",
                self.time_limit.as_secs()
            );
            Ok(Verdict::remove(Rule::Promotion))
        } else {
            Ok(Verdict::approve())
        }
    }
}

pub fn setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    let env = ctx.env();
    if normalize(&env.settings.domains.watched).is_empty() {
        return Err(SetupError::Settings("domains.watched must list at least one host".to_string()));
    }
    ctx.add_extension(Arc::new(PromotionChecker::new(env)));
    Ok(())
}
