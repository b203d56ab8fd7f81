//! Bounded, insertion-ordered recency caches.
//!
//! - [`RecencySet`]: "have I seen this id" window used to avoid reprocessing.
//! - [`RecencyMap`]: keyed variant used to anchor state across calls
//!   (e.g. thread id -> sticky comment id).
//!
//! Both evict oldest-first once they grow past their capacity. Neither is
//! internally synchronized; owners shared across threads wrap them in a lock.

mod map;
mod set;

pub use map::RecencyMap;
pub use set::RecencySet;
