//! Working-copy provisioning and commit operations
//!
//! A `WorkingCopy` is one node's private clone of the broker repository,
//! checked out on the topic branch. The working directory is the visible
//! queue: every message and checkpoint is a file, every mutation is a commit.
//! Clones are disposable replicas; the remote is the source of truth.
//!
//! `git2::Repository` is not thread-safe, so a `WorkingCopy` must never be
//! shared across threads. Each producer/consumer owns its own.

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{BranchType, Commit, Cred, ErrorCode, FetchOptions, RemoteCallbacks, Repository, Signature};
use tracing::{debug, info};

use libgitmq_core::config::{Author, Credentials};
use libgitmq_core::types::LOG_FILE_EXT;

use crate::GitError;

/// A node's local clone of the broker repository, on one topic branch.
pub struct WorkingCopy {
    pub(crate) repo: Repository,
    workdir: PathBuf,
    branch: String,
    author: Author,
    pub(crate) credentials: Option<Credentials>,
}

impl std::fmt::Debug for WorkingCopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingCopy")
            .field("workdir", &self.workdir)
            .field("branch", &self.branch)
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

impl WorkingCopy {
    /// Clone the broker repository into `dir` and check out the topic branch.
    ///
    /// An empty remote, or a remote that does not carry the topic branch yet,
    /// is not an error: the clone proceeds with a local-only branch and the
    /// first push will create the ref on the remote.
    pub fn provision(
        dir: &Path,
        remote_url: &str,
        branch: &str,
        author: Author,
        credentials: Option<Credentials>,
    ) -> Result<Self, GitError> {
        debug!(url = remote_url, branch, "cloning broker repository");

        let mut callbacks = RemoteCallbacks::new();
        if let Some(creds) = credentials.clone() {
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext(&creds.username, &creds.password)
            });
        }
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let repo = RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(remote_url, dir)
            .map_err(|e| match e.code() {
                ErrorCode::Auth => GitError::Auth(e.message().to_string()),
                _ => GitError::Provision {
                    url: remote_url.to_string(),
                    reason: e.message().to_string(),
                },
            })?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::Provision {
                url: remote_url.to_string(),
                reason: "clone has no working directory".to_string(),
            })?
            .to_path_buf();

        let copy = Self {
            repo,
            workdir,
            branch: branch.to_string(),
            author,
            credentials,
        };

        match copy.checkout_topic_branch() {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                info!(branch, "topic has no history yet; starting local-only branch");
                copy.repo.set_head(&copy.branch_ref())?;
            }
            Err(e) => return Err(e),
        }

        Ok(copy)
    }

    /// Point HEAD at the topic branch, creating it from the remote-tracking
    /// ref when the remote already carries the topic.
    fn checkout_topic_branch(&self) -> Result<(), GitError> {
        let remote_ref = format!("refs/remotes/origin/{}", self.branch);

        if self.repo.find_branch(&self.branch, BranchType::Local).is_err() {
            match self.repo.find_reference(&remote_ref) {
                Ok(reference) => {
                    let commit = reference.peel_to_commit()?;
                    self.repo.branch(&self.branch, &commit, false)?;
                }
                Err(_) => {
                    // Remote exists but has never seen this topic. Fork from
                    // the clone's HEAD if there is one; otherwise the topic
                    // starts unborn.
                    match self.repo.head() {
                        Ok(head) => {
                            let commit = head.peel_to_commit()?;
                            self.repo.branch(&self.branch, &commit, false)?;
                        }
                        Err(e)
                            if e.code() == ErrorCode::UnbornBranch
                                || e.code() == ErrorCode::NotFound =>
                        {
                            return Err(GitError::EmptyTopic(self.branch.clone()));
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        self.repo.set_head(&self.branch_ref())?;
        self.repo
            .checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;
        Ok(())
    }

    /// Write `content` to `file_name` in the working tree, stage it, and
    /// commit with the configured author. Works on an unborn topic branch
    /// (the commit becomes the branch root).
    pub fn write_and_commit(&self, file_name: &str, content: &str) -> Result<git2::Oid, GitError> {
        std::fs::write(self.workdir.join(file_name), content)?;

        let message = format!("Creating file: {}", file_name);
        self.stage_and_commit(file_name, &message, Staging::Add)
    }

    /// Remove `file_name` from the working tree and commit the removal.
    ///
    /// Returns [`GitError::NotFound`] when the file does not exist; callers
    /// treat that as a no-op warning rather than a failure.
    pub fn remove_and_commit(&self, file_name: &str) -> Result<git2::Oid, GitError> {
        let path = self.workdir.join(file_name);
        if !path.exists() {
            return Err(GitError::NotFound(file_name.to_string()));
        }
        std::fs::remove_file(&path)?;

        let message = format!("Removing file: {}", file_name);
        self.stage_and_commit(file_name, &message, Staging::Remove)
    }

    fn stage_and_commit(
        &self,
        file_name: &str,
        message: &str,
        staging: Staging,
    ) -> Result<git2::Oid, GitError> {
        let commit_err = |reason: String| GitError::Commit {
            file: file_name.to_string(),
            reason,
        };

        let mut index = self.repo.index()?;
        let staged = match staging {
            Staging::Add => index.add_path(Path::new(file_name)),
            Staging::Remove => index.remove_path(Path::new(file_name)),
        };
        staged.map_err(|e| commit_err(e.message().to_string()))?;
        index.write()?;

        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                None
            }
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(|e| commit_err(e.message().to_string()))?;
        debug!(file = file_name, %oid, "committed");
        Ok(oid)
    }

    /// Names of all log files (`*.json`) in the working directory, sorted.
    pub fn list_log_files(&self) -> Result<Vec<String>, GitError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.workdir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(LOG_FILE_EXT) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a log file's body from the working directory.
    pub fn read_file(&self, file_name: &str) -> Result<String, GitError> {
        let path = self.workdir.join(file_name);
        if !path.exists() {
            return Err(GitError::NotFound(file_name.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// The topic branch this working copy tracks.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// The working directory holding the visible queue of files.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub(crate) fn branch_ref(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }

    pub(crate) fn signature(&self) -> Result<Signature<'static>, GitError> {
        Ok(Signature::now(&self.author.name, &self.author.email)?)
    }

    pub(crate) fn remote_callbacks(&self) -> RemoteCallbacks<'static> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(creds) = self.credentials.clone() {
            callbacks.credentials(move |_url, _username, _allowed| {
                Cred::userpass_plaintext(&creds.username, &creds.password)
            });
        }
        callbacks
    }
}

enum Staging {
    Add,
    Remove,
}
