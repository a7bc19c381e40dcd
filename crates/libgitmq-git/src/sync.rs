//! Fetch/merge synchronization and push
//!
//! Synchronize is "fetch the topic branch, then bring the local working tree
//! up to the merged state". Message files are named by globally unique order
//! keys, so diverged histories normally merge cleanly (add/add of distinct
//! files); a real index conflict is surfaced as [`GitError::SyncConflict`]
//! and never auto-resolved.
//!
//! Push uses git's compare-and-swap semantics: a per-ref rejection reported
//! through the push callbacks becomes [`GitError::PushRejected`], which
//! callers handle by resynchronizing and pushing again.

use std::cell::RefCell;
use std::rc::Rc;

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, FetchOptions, PushOptions};
use tracing::debug;

use crate::workdir::WorkingCopy;
use crate::GitError;

/// What a synchronize call did to the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local branch already matched the remote.
    UpToDate,
    /// Local branch fast-forwarded to the remote tip.
    FastForwarded,
    /// Diverged histories merged cleanly into a merge commit.
    Merged,
}

impl WorkingCopy {
    /// Fetch the topic branch from origin and merge it into the local
    /// working tree.
    ///
    /// Returns [`GitError::NotAdvertised`] when no peer has pushed the topic
    /// branch yet (callers treat this as "no new data") and
    /// [`GitError::SyncConflict`] when local and remote histories diverged
    /// with real conflicts.
    pub fn synchronize(&self) -> Result<SyncOutcome, GitError> {
        let branch = self.branch().to_string();
        let mut remote = self.repo.find_remote("origin")?;

        let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", branch);
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());

        if let Err(e) = remote.fetch(&[refspec.as_str()], Some(&mut fetch_options), None) {
            return Err(match e.code() {
                ErrorCode::Auth => GitError::Auth(e.message().to_string()),
                // libgit2 reports a missing remote ref for an explicit
                // refspec as a generic "couldn't find remote ref" error.
                ErrorCode::NotFound => GitError::NotAdvertised(branch),
                _ if e.message().contains("remote ref") => GitError::NotAdvertised(branch),
                _ => GitError::Git(e),
            });
        }
        drop(remote);

        let remote_ref = match self
            .repo
            .find_reference(&format!("refs/remotes/origin/{}", branch))
        {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(GitError::NotAdvertised(branch))
            }
            Err(e) => return Err(e.into()),
        };
        let annotated = self.repo.reference_to_annotated_commit(&remote_ref)?;

        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            debug!(branch = %branch, "already up to date");
            return Ok(SyncOutcome::UpToDate);
        }

        if analysis.is_unborn() || analysis.is_fast_forward() {
            self.repo.reference(
                &self.branch_ref(),
                annotated.id(),
                true,
                "gitmq: fast-forward to remote tip",
            )?;
            self.repo.set_head(&self.branch_ref())?;
            self.repo
                .checkout_head(Some(CheckoutBuilder::new().force()))?;
            debug!(branch = %branch, "fast-forwarded to remote tip");
            return Ok(SyncOutcome::FastForwarded);
        }

        // Diverged: merge the remote tip into the local branch.
        self.repo.merge(&[&annotated], None, None)?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            self.repo.cleanup_state()?;
            self.repo
                .checkout_head(Some(CheckoutBuilder::new().force()))?;
            return Err(GitError::SyncConflict {
                branch,
                reason: "local and remote histories diverged with conflicting entries"
                    .to_string(),
            });
        }

        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;
        let local_commit = self.repo.head()?.peel_to_commit()?;
        let remote_commit = self.repo.find_commit(annotated.id())?;
        let message = format!("Merging remote '{}' into local", branch);
        self.repo.commit(
            Some("HEAD"),
            &sig,
            &sig,
            &message,
            &tree,
            &[&local_commit, &remote_commit],
        )?;
        self.repo.cleanup_state()?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;

        debug!(branch = %branch, "merged diverged histories");
        Ok(SyncOutcome::Merged)
    }

    /// Push the topic branch to origin.
    ///
    /// A per-ref rejection (the remote advanced past our base) is
    /// [`GitError::PushRejected`]; credential rejection is [`GitError::Auth`].
    pub fn push(&self) -> Result<(), GitError> {
        let rejection: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
        let rejection_cb = Rc::clone(&rejection);

        let mut callbacks = self.remote_callbacks();
        callbacks.push_update_reference(move |refname, status| {
            if let Some(msg) = status {
                *rejection_cb.borrow_mut() = Some(format!("{}: {}", refname, msg));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", self.branch());
        let mut remote = self.repo.find_remote("origin")?;
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| match e.code() {
                ErrorCode::Auth => GitError::Auth(e.message().to_string()),
                ErrorCode::NotFastForward => GitError::PushRejected(e.message().to_string()),
                _ => GitError::Git(e),
            })?;

        let rejected = rejection.borrow().clone();
        if let Some(msg) = rejected {
            return Err(GitError::PushRejected(msg));
        }
        debug!(branch = self.branch(), "pushed");
        Ok(())
    }
}
