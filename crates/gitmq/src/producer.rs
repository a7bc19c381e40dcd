//! Producer side of the protocol

use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, info};

use libgitmq_core::{LogFileName, Message, OrderKeyGenerator};
use libgitmq_git::WorkingCopy;

use crate::retry::push_with_retry;
use crate::BrokerError;

/// Publishes messages to one topic from its own working copy.
pub struct Producer {
    copy: WorkingCopy,
    node: String,
    clock: Arc<OrderKeyGenerator>,
    // Keeps the clone directory alive; dropped (and deleted) with the producer.
    _dir: TempDir,
}

impl Producer {
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

    /// Publish one message to the topic.
    ///
    /// Synchronizes, writes the message file, commits, and pushes. A lost
    /// push race is retried (resynchronize, push again) a bounded number of
    /// times; the local commit is never discarded.
    pub fn publish(&self, event: &str, body: &str) -> Result<Message, BrokerError> {
        match self.copy.synchronize() {
            Ok(outcome) => debug!(topic = self.copy.branch(), ?outcome, "synchronized"),
            Err(e) if e.is_recoverable() => {
                debug!(topic = self.copy.branch(), "topic not on remote yet")
            }
            Err(e) => return Err(e.into()),
        }

        let name = LogFileName::message(self.clock.next(), &self.node, event)?;
        let file_name = name.to_string();

        self.copy.write_and_commit(&file_name, body)?;
        push_with_retry(&self.copy)?;

        info!(topic = self.copy.branch(), file = %file_name, "published");
        Ok(Message::from_parts(&name, body.to_string()))
    }

    /// The topic this producer publishes to.
    pub fn topic(&self) -> &str {
        self.copy.branch()
    }

    /// This producer's node identity.
    pub fn node(&self) -> &str {
        &self.node
    }
}
