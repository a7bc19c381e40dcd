//! Git working-copy operations for gitmq
//!
//! This crate is the only place gitmq touches git2. It provides:
//! - Working-copy provisioning (clone + topic branch checkout)
//! - Fetch + merge synchronization with typed divergence errors
//! - File add/remove commits with configured authorship
//! - Push with optimistic-concurrency rejection surfaced as a typed error

mod error;
mod sync;
mod workdir;

pub use error::GitError;
pub use sync::SyncOutcome;
pub use workdir::WorkingCopy;
