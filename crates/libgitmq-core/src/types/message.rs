use serde::{Deserialize, Serialize};

use super::filename::LogFileName;

/// A delivered or published message.
///
/// Immutable once created. The full original file name is carried so that
/// acknowledgment can remove exactly the file the producer committed,
/// independent of how the name was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic order key; delivery order within a topic.
    pub order_key: u64,
    /// Identity of the peer that published the message.
    pub node: String,
    /// Logical message tag.
    pub event: String,
    /// Opaque payload; JSON by convention, never validated.
    pub body: String,
    /// The exact file name this message is stored under in the topic.
    pub file_name: String,
}

impl Message {
    /// Assemble a message from its parsed file name and body.
    pub fn from_parts(name: &LogFileName, body: String) -> Self {
        Self {
            order_key: name.order_key,
            node: name.node.clone(),
            event: name.event.clone(),
            body,
            file_name: name.to_string(),
        }
    }
}
