//! Collects comments by selected authors into one sticky per thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use warden_cache::{RecencyMap, RecencySet};
use warden_core::{CheckerError, HighlightSettings, ItemId, ModerationItem, Verdict};
use warden_rules::{Capability, Checker, ExtensionContext, SetupError};

use crate::env::CheckerEnv;
use crate::platform::Platform;

const HEADING: &str = "## Highlighted comments";

/// Sticky comment anchored in one thread.
#[derive(Debug, Clone)]
struct Anchor {
    sticky_id: ItemId,
    links: Vec<String>,
}

impl Anchor {
    fn body(&self) -> String {
        let mut body = String::from(HEADING);
        for (i, link) in self.links.iter().enumerate() {
            body.push_str(&format!("\n\n[Comment {}]({})", i + 1, link));
        }
        body
    }
}

struct HighlightState {
    seen: RecencySet<ItemId>,
    /// Thread id to its sticky.
    anchors: RecencyMap<ItemId, Anchor>,
}

pub struct HighlightChecker {
    author_classes: Vec<String>,
    /// A full sticky is left as is and the thread gets a new one.
    max_links: usize,
    platform: Arc<dyn Platform>,
    state: Mutex<HighlightState>,
}

impl HighlightChecker {
    pub fn new(settings: &HighlightSettings, platform: Arc<dyn Platform>) -> Self {
        Self {
            author_classes: settings
                .author_classes
                .iter()
                .map(|c| c.trim().to_ascii_lowercase())
                .collect(),
            max_links: settings.max_links.max(1),
            platform,
            state: Mutex::new(HighlightState {
                seen: RecencySet::new(settings.dedup_capacity),
                anchors: RecencyMap::new(settings.anchor_capacity),
            }),
        }
    }

    fn is_highlighted(&self, item: &ModerationItem) -> bool {
        item.author_flair_class
            .as_deref()
            .map(|class| self.author_classes.iter().any(|c| c.eq_ignore_ascii_case(class)))
            .unwrap_or(false)
    }

    /// Sticky id anchored in thread `container_id`, if remembered.
    pub fn sticky_for(&self, container_id: &str) -> Option<ItemId> {
        self.lock_state()
            .anchors
            .get(container_id)
            .map(|a| a.sticky_id.clone())
    }

    fn lock_state(&self) -> MutexGuard<'_, HighlightState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Checker for HighlightChecker {
    fn name(&self) -> &str {
        "highlight"
    }

    fn capability(&self) -> Capability {
        Capability::CommentOnly
    }

    fn evaluate(&self, item: &ModerationItem) -> Result<Verdict, CheckerError> {
        let Some(container_id) = item.container_id.as_deref() else {
            return Ok(Verdict::pass());
        };
        if !self.is_highlighted(item) {
            return Ok(Verdict::pass());
        }

        let mut state = self.lock_state();
        if state.seen.contains(&item.id) {
            return Ok(Verdict::pass());
        }

        let link = item.locator().to_string();
        let open = state
            .anchors
            .get(container_id)
            .filter(|a| a.links.len() < self.max_links)
            .cloned();
        match open {
            Some(mut anchor) => {
                anchor.links.push(link);
                self.platform.edit_sticky(&anchor.sticky_id, &anchor.body())?;
                debug!(item_id = %item.id, container_id, "appended comment to sticky");
                state.anchors.set(container_id.to_string(), anchor);
            }
            None => {
                let mut anchor = Anchor {
                    sticky_id: String::new(),
                    links: vec![link],
                };
                anchor.sticky_id = self.platform.create_sticky(container_id, &anchor.body())?;
                info!(item_id = %item.id, container_id, sticky_id = %anchor.sticky_id, "created highlight sticky");
                state.anchors.set(container_id.to_string(), anchor);
            }
        }
        // Only recorded once announced, so a failed announcement is retried.
        state.seen.record(item.id.clone());

        Ok(Verdict::pass())
    }
}

pub fn setup(ctx: &mut ExtensionContext<'_, CheckerEnv>) -> Result<(), SetupError> {
    let env = ctx.env();
    let settings = &env.settings.highlight;
    if settings.dedup_capacity == 0 || settings.anchor_capacity == 0 || settings.max_links == 0 {
        return Err(SetupError::Settings(
            "highlight capacities and max_links must be greater than zero".to_string(),
        ));
    }
    ctx.add_extension(Arc::new(HighlightChecker::new(settings, Arc::clone(&env.platform))));
    Ok(())
}
