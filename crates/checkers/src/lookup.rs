//! Author history and video metadata used by the promotion check.

use std::collections::HashMap;
use std::time::Duration;

use warden_core::CheckerError;

/// External lookups behind the promotion check, implemented by the
/// platform client or a search index.
pub trait PromotionLookup: Send + Sync {
    /// Number of comments `author` has made in the watched communities.
    fn comment_count(&self, author: &str) -> Result<u64, CheckerError>;

    /// Running time of the video at `url`.
    fn video_duration(&self, url: &str) -> Result<Duration, CheckerError>;
}

/// Lookup answering from fixed tables. Unknown authors and videos are
/// lookup failures.
#[derive(Debug, Default)]
pub struct StaticLookup {
    comments: HashMap<String, u64>,
    videos: HashMap<String, Duration>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(mut self, author: &str, count: u64) -> Self {
        self.comments.insert(author.to_string(), count);
        self
    }

    pub fn with_video(mut self, url: &str, duration: Duration) -> Self {
        self.videos.insert(url.to_string(), duration);
        self
    }
}

impl PromotionLookup for StaticLookup {
    fn comment_count(&self, author: &str) -> Result<u64, CheckerError> {
        self.comments.get(author).copied().ok_or_else(|| CheckerError::Lookup {
            item_id: author.to_string(),
            reason: "no comment history".to_string(),
        })
    }

    fn video_duration(&self, url: &str) -> Result<Duration, CheckerError> {
        self.videos.get(url).copied().ok_or_else(|| CheckerError::Lookup {
            item_id: url.to_string(),
            reason: "unknown video".to_string(),
        })
    }
}
