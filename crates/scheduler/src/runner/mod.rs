//! Job scheduler runner -- owns jobs, timer threads, and the worker pool.
//!
//! Split into focused submodules:
//! - `core`: JobScheduler struct, registration, manual fires, and accessors
//! - `timer`: Timer threads, start/stop lifecycle

mod core;
mod timer;

pub use self::core::JobScheduler;
