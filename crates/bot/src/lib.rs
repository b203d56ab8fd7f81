//! Moderation bot runtime: item feeds, the per-kind stream loops, and the
//! dry-run platform used when no live client is wired in.

pub mod dry_run;
pub mod feed;
pub mod stream;

pub use dry_run::{DryRunPlatform, DryRunSink};
pub use feed::{FeedError, ItemFeed, JsonLinesFeed};
pub use stream::{StreamLoop, StreamOptions, StreamStats};
