//! Filename codec for the log file convention
//!
//! Every record in a topic is a working-tree file named
//! `{order_key}_{node}_{event}.json`. The order key is the decimal output of
//! the monotonic generator, `node` identifies the producing/consuming peer,
//! and `event` is the logical message tag. Checkpoint markers reuse the same
//! convention with the reserved `OK` tag.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use super::{CHECKPOINT_EVENT, LOG_FILE_EXT};

/// Parsed form of a log file name.
///
/// Ordering is by `order_key` first (numerically, so keys of different digit
/// widths still compare correctly), then node, then event. This is the
/// delivery order of the topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogFileName {
    pub order_key: u64,
    pub node: String,
    pub event: String,
}

/// Check that a node or event field fits the filename convention.
///
/// `_` is the field separator and path separators would escape the working
/// directory, so neither is allowed inside a field.
pub fn validate_field(kind: &str, value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidName {
            value: value.to_string(),
            reason: format!("{} must not be empty", kind),
        });
    }
    if let Some(bad) = value.chars().find(|c| matches!(c, '_' | '/' | '\\' | '.')) {
        return Err(CoreError::InvalidName {
            value: value.to_string(),
            reason: format!("{} must not contain '{}'", kind, bad),
        });
    }
    Ok(())
}

impl LogFileName {
    /// Build a message file name, validating the fields.
    pub fn message(order_key: u64, node: &str, event: &str) -> Result<Self, CoreError> {
        validate_field("node", node)?;
        validate_field("event", event)?;
        if event == CHECKPOINT_EVENT {
            return Err(CoreError::InvalidName {
                value: event.to_string(),
                reason: format!("event tag '{}' is reserved for checkpoints", CHECKPOINT_EVENT),
            });
        }
        Ok(Self {
            order_key,
            node: node.to_string(),
            event: event.to_string(),
        })
    }

    /// Build a checkpoint marker name for the given node.
    pub fn checkpoint(order_key: u64, node: &str) -> Result<Self, CoreError> {
        validate_field("node", node)?;
        Ok(Self {
            order_key,
            node: node.to_string(),
            event: CHECKPOINT_EVENT.to_string(),
        })
    }

    /// Whether this is a checkpoint marker (any node).
    pub fn is_checkpoint(&self) -> bool {
        self.event == CHECKPOINT_EVENT
    }

    /// Whether this is a checkpoint marker written by `node`.
    pub fn is_checkpoint_for(&self, node: &str) -> bool {
        self.is_checkpoint() && self.node == node
    }
}

impl fmt::Display for LogFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}{}",
            self.order_key, self.node, self.event, LOG_FILE_EXT
        )
    }
}

impl FromStr for LogFileName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s
            .strip_suffix(LOG_FILE_EXT)
            .ok_or_else(|| CoreError::ParseFileName(s.to_string()))?;

        let parts: Vec<&str> = stem.split('_').collect();
        let (key, node, event) = match parts.as_slice() {
            [k, n, e] => (*k, *n, *e),
            _ => return Err(CoreError::ParseFileName(s.to_string())),
        };

        let order_key: u64 = key
            .parse()
            .map_err(|_| CoreError::ParseFileName(s.to_string()))?;
        validate_field("node", node).map_err(|_| CoreError::ParseFileName(s.to_string()))?;
        validate_field("event", event).map_err(|_| CoreError::ParseFileName(s.to_string()))?;

        Ok(Self {
            order_key,
            node: node.to_string(),
            event: event.to_string(),
        })
    }
}
