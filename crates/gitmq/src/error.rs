use thiserror::Error;

use libgitmq_core::CoreError;
use libgitmq_git::GitError;

/// Errors surfaced to producer/consumer callers.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("git error: {0}")]
    Git(#[from] GitError),

    #[error("push retries exhausted after {attempts} attempts; the remote kept advancing")]
    ConcurrencyExhausted { attempts: u32 },
}
