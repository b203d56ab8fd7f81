use std::sync::Arc;

use warden_core::CheckerSettings;
use warden_rules::ModerationSink;

use crate::lookup::PromotionLookup;
use crate::platform::Platform;

/// Everything a built-in module's setup may use.
#[derive(Clone)]
pub struct CheckerEnv {
    pub settings: CheckerSettings,
    pub sink: Arc<dyn ModerationSink>,
    pub platform: Arc<dyn Platform>,
    pub lookup: Arc<dyn PromotionLookup>,
}

impl CheckerEnv {
    pub fn new(
        settings: CheckerSettings,
        sink: Arc<dyn ModerationSink>,
        platform: Arc<dyn Platform>,
        lookup: Arc<dyn PromotionLookup>,
    ) -> Self {
        Self {
            settings,
            sink,
            platform,
            lookup,
        }
    }
}
