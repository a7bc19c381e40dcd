use thiserror::Error;

/// Errors that can occur during git working-copy operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("provisioning failed for {url}: {reason}")]
    Provision { url: String, reason: String },

    #[error("topic '{0}' has no commits yet")]
    EmptyTopic(String),

    #[error("remote has not advertised branch '{0}' yet")]
    NotAdvertised(String),

    #[error("sync conflict on '{branch}': {reason}")]
    SyncConflict { branch: String, reason: String },

    #[error("commit failed for {file}: {reason}")]
    Commit { file: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("push rejected: {0}")]
    PushRejected(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Whether this error means "no data on the remote yet" rather than a
    /// real failure. Callers degrade these to an empty result.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, GitError::EmptyTopic(_) | GitError::NotAdvertised(_))
    }
}
