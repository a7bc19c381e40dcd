//! Consumer side of the protocol
//!
//! Each `batch_receive` call cycles the working copy through
//! synchronize → scan → deliver: the file listing is classified into
//! checkpoint markers and messages, everything past this node's latest
//! checkpoint is delivered as one batch, and a new checkpoint is committed
//! and pushed before the batch is returned.

use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info, warn};

use libgitmq_core::types::CHECKPOINT_BODY;
use libgitmq_core::{plan_delivery, LogFileName, Message, OrderKeyGenerator};
use libgitmq_git::{GitError, WorkingCopy};

use crate::retry::push_with_retry;
use crate::BrokerError;

/// Reads messages from one topic on behalf of one node identity.
pub struct Consumer {
    copy: WorkingCopy,
    node: String,
    clock: Arc<OrderKeyGenerator>,
    // Keeps the clone directory alive; dropped (and deleted) with the consumer.
    _dir: TempDir,
}

impl Consumer {
    pub(crate) fn new(
        copy: WorkingCopy,
        node: String,
        clock: Arc<OrderKeyGenerator>,
        dir: TempDir,
    ) -> Self {
        Self {
            copy,
            node,
            clock,
            _dir: dir,
        }
    }

    /// Receive every message published since this node's last checkpoint.
    ///
    /// Returns the pending messages in order-key order, or an empty batch
    /// when the topic has nothing new (including when no peer has created
    /// the topic branch yet).
    ///
    /// When a non-empty batch is delivered, a checkpoint is committed and
    /// pushed *before* this method returns, i.e. before the caller has
    /// processed anything. A crash after checkpointing skips the batch:
    /// at-most-once from the checkpoint forward.
    pub fn batch_receive(&self) -> Result<Vec<Message>, BrokerError> {
        match self.copy.synchronize() {
            Ok(outcome) => debug!(topic = self.copy.branch(), ?outcome, "synchronized"),
            Err(e) if e.is_recoverable() => {
                debug!(topic = self.copy.branch(), "waiting for topic to appear");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let listing = self.copy.list_log_files()?;
        if listing.is_empty() {
            return Ok(Vec::new());
        }

        let mut files: Vec<LogFileName> = Vec::with_capacity(listing.len());
        for name in &listing {
            match name.parse() {
                Ok(parsed) => files.push(parsed),
                Err(_) => warn!(file = %name, "skipping unparseable log file"),
            }
        }

        let pending = plan_delivery(&files, &self.node);
        if pending.is_empty() {
            debug!(topic = self.copy.branch(), "no new messages");
            return Ok(Vec::new());
        }

        let mut batch = Vec::with_capacity(pending.len());
        for name in &pending {
            let body = self.copy.read_file(&name.to_string())?;
            batch.push(Message::from_parts(name, body));
        }

        self.write_checkpoint()?;

        info!(
            topic = self.copy.branch(),
            node = %self.node,
            count = batch.len(),
            "delivering batch"
        );
        Ok(batch)
    }

    /// Remove an already-delivered message from the topic.
    ///
    /// Matches the message's full original file name. A message that is
    /// already gone (acknowledged by another run, or compacted away) is a
    /// no-op, logged as a warning.
    pub fn acknowledge(&self, message: &Message) -> Result<(), BrokerError> {
        match self.copy.remove_and_commit(&message.file_name) {
            Ok(_) => {
                push_with_retry(&self.copy)?;
                info!(file = %message.file_name, "acknowledged");
                Ok(())
            }
            Err(GitError::NotFound(name)) => {
                warn!(file = %name, "acknowledged message was already removed");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Commit and push a checkpoint marker recording the delivery position.
    fn write_checkpoint(&self) -> Result<(), BrokerError> {
        let name = LogFileName::checkpoint(self.clock.next(), &self.node)?;
        self.copy
            .write_and_commit(&name.to_string(), CHECKPOINT_BODY)?;
        push_with_retry(&self.copy)?;
        debug!(file = %name, "checkpoint written");
        Ok(())
    }

    /// The topic this consumer reads.
    pub fn topic(&self) -> &str {
        self.copy.branch()
    }

    /// This consumer's node identity.
    pub fn node(&self) -> &str {
        &self.node
    }
}
