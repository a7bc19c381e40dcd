pub mod filename;
pub mod message;

pub use filename::LogFileName;
pub use message::Message;

/// Event tag reserved for checkpoint marker files.
pub const CHECKPOINT_EVENT: &str = "OK";

/// Body written into every checkpoint marker file.
pub const CHECKPOINT_BODY: &str = "PROCESSED";

/// Extension shared by all log files in a topic.
pub const LOG_FILE_EXT: &str = ".json";
