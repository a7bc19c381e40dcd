use thiserror::Error;

/// Main error type for core gitmq operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid name {value:?}: {reason}")]
    InvalidName { value: String, reason: String },

    #[error("unparseable log file name: {0}")]
    ParseFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
