//! Built-in rule modules.
//!
//! Each module exposes a setup entry point in [`builtin_catalog`]:
//! - `text`: approves text posts
//! - `domain`: approves or removes link posts by host
//! - `flair`: tracks unflaired posts, warns their authors, then removes them
//! - `highlight`: collects comments from selected authors into a sticky per thread
//! - `promotion`: checks links to watched hosts against the author's history
//! - `all`: flairs the community's posts that reach the front page listing

pub mod all;
pub mod catalog;
pub mod domain;
pub mod env;
pub mod flair;
pub mod highlight;
pub mod lookup;
pub mod platform;
pub mod promotion;
pub mod text;

pub use all::FrontPageFlair;
pub use catalog::builtin_catalog;
pub use domain::DomainChecker;
pub use env::CheckerEnv;
pub use flair::{FlairChecker, SweepReport};
pub use highlight::HighlightChecker;
pub use lookup::{PromotionLookup, StaticLookup};
pub use platform::{Platform, RecordingPlatform};
pub use promotion::PromotionChecker;
pub use text::TextChecker;
