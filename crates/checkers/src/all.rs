//! Front page flairing.
//!
//! A periodic job reads the top of the site-wide hot listing and flairs
//! the posts that belong to the moderated communities.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};
use warden_cache::RecencySet;
use warden_core::{AllSettings, CheckerError, ItemId, ModerationItem};
use warden_rules::{ExtensionContext, SetupError};
use warden_scheduler::JobError;

use crate::env::CheckerEnv;
use crate::platform::Platform;

pub const FLAIR_JOB: &str = "all.flair";

pub struct FrontPageFlair {
    communities: Vec<String>,
    flair_text: String,
    listing_limit: usize,
    platform: Arc<dyn Platform>,
    /// Posts already flaired, so a post lingering in the listing is
    /// flaired once.
    flaired: Mutex<RecencySet<ItemId>>,
}

impl FrontPageFlair {
    pub fn new(settings: &AllSettings, platform: Arc<dyn Platform>) -> Self {
        Self {
            communities: settings
                .communities
                .iter()
                .map(|c| c.trim().to_ascii_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            flair_text: settings.flair_text.clone(),
            listing_limit: settings.listing_limit,
            platform,
            flaired: Mutex::new(RecencySet::new(settings.capacity)),
        }
    }

    pub fn is_flaired(&self, id: &str) -> bool {
        self.lock_flaired().contains(&id.to_string())
    }

    /// Flair every listed post from a moderated community that was not
    /// flaired before. Returns how many were flaired.
    pub fn flair_listing(&self) -> Result<usize, CheckerError> {
        let listing = self.platform.hot_listing(self.listing_limit)?;
        let mut flaired = 0;
        for post in listing.iter().filter(|p| self.is_moderated(p)) {
            if self.lock_flaired().contains(&post.id) {
                continue;
            }
            self.platform.set_flair(post, &self.flair_text)?;
            self.lock_flaired().record(post.id.clone());
            debug!(item_id = %post.id, "flaired front page post");
            flaired += 1;
        }
        Ok(flaired)
    }

    fn is_moderated(&self, post: &ModerationItem) -> bool {
        post.community
            .as_deref()
            .is_some_and(|c| self.communities.iter().any(|m| m.eq_ignore_ascii_case(c)))
    }

    fn run(&self) -> Result<(), JobError> {
        match self.flair_listing() {
            Ok(0) => Ok(()),
            Ok(flaired) => {
                info!(flaired, "flaired front page posts");
                Ok(())
            }
            Err(e) => Err(JobError::Failed(e.to_string())),
        }
    }

    fn lock_flaired(&self) -> MutexGuard<'_, RecencySet<ItemId>> {
        self.flaired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registers the flairing job only; the module adds no checker.
pub fn setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    let env = ctx.env();
    let settings = &env.settings.all;
    let job = Arc::new(FrontPageFlair::new(settings, Arc::clone(&env.platform)));
    if job.communities.is_empty() {
        return Err(SetupError::Settings("all.communities must not be empty".to_string()));
    }
    ctx.register_job(FLAIR_JOB, Duration::from_secs(settings.interval_secs), move || job.run())
}
