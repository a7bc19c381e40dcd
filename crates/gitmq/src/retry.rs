//! Bounded push retry
//!
//! A rejected push means another peer advanced the remote between our last
//! synchronize and now. The local commit is kept, the remote is merged in,
//! and the push is re-attempted. Message and checkpoint files carry globally
//! unique names, so these merges are clean in normal operation.

use tracing::{debug, warn};

use libgitmq_git::{GitError, WorkingCopy};

use crate::BrokerError;

/// Attempts before giving up on a contended push.
pub(crate) const MAX_PUSH_ATTEMPTS: u32 = 5;

/// Push local commits, resynchronizing and retrying on rejection.
pub(crate) fn push_with_retry(copy: &WorkingCopy) -> Result<(), BrokerError> {
    for attempt in 1..=MAX_PUSH_ATTEMPTS {
        match copy.push() {
            Ok(()) => {
                debug!(branch = copy.branch(), attempt, "push succeeded");
                return Ok(());
            }
            Err(GitError::PushRejected(reason)) => {
                warn!(
                    branch = copy.branch(),
                    attempt, reason = %reason, "push rejected; resynchronizing"
                );
                match copy.synchronize() {
                    Ok(_) => {}
                    // The remote ref vanishing between rejection and fetch is
                    // indistinguishable from "nothing to merge"; retry anyway.
                    Err(e) if e.is_recoverable() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(BrokerError::ConcurrencyExhausted {
        attempts: MAX_PUSH_ATTEMPTS,
    })
}
