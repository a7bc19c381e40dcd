use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Commit authorship attached to every message and checkpoint commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Username/password credentials presented to the remote on push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Node-level broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// URL of the shared remote repository acting as the broker.
    pub broker_url: String,
    /// Commit authorship for this node.
    pub author: Author,
    /// Push credentials; not needed for local/file remotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Load broker configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BrokerConfig, CoreError> {
    let content = std::fs::read_to_string(path)?;
    let config: BrokerConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save broker configuration to a TOML file.
pub fn save_config(path: &Path, config: &BrokerConfig) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> BrokerConfig {
        BrokerConfig {
            broker_url: "https://example.com/broker.git".to_string(),
            author: Author {
                name: "Node One".to_string(),
                email: "node1@example.com".to_string(),
            },
            credentials: Some(Credentials {
                username: "node1".to_string(),
                password: "secret".to_string(),
            }),
        }
    }

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gitmq").join("config.toml");

        let config = sample();
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_credentials_are_optional() {
        let toml_src = r#"
            broker_url = "file:///tmp/broker.git"

            [author]
            name = "Node One"
            email = "node1@example.com"
        "#;
        let config: BrokerConfig = toml::from_str(toml_src).unwrap();
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
