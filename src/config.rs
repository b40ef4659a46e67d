//! CLI credential configuration.
//!
//! Parses the credentials file at `~/.config/lp-build/config.toml`.
//! The library itself only ever sees the resulting `Credentials`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::Credentials;

/// Lane configuration file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct LaneConfig {
    pub username: String,

    pub token: String,

    pub secret: String,

    /// OAuth consumer key when it differs from the username.
    #[serde(default)]
    pub consumer_key: Option<String>,

    /// Alternate API root (staging, local mock).
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Errors that can occur when loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("config field '{0}' must not be empty")]
    EmptyField(&'static str),
}

impl LaneConfig {
    /// Load from the default location (~/.config/lp-build/config.toml).
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load(&path)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            ))
        })?;
        Ok(PathBuf::from(home).join(".config/lp-build/config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: LaneConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::EmptyField("username"));
        }
        if self.token.is_empty() {
            return Err(ConfigError::EmptyField("token"));
        }
        if self.secret.is_empty() {
            return Err(ConfigError::EmptyField("secret"));
        }
        Ok(())
    }

    /// Signing credentials for this configuration.
    pub fn credentials(&self) -> Credentials {
        let credentials = Credentials::new(
            self.username.clone(),
            self.token.clone(),
            self.secret.clone(),
        );
        match &self.consumer_key {
            Some(consumer_key) => credentials.with_consumer_key(consumer_key.clone()),
            None => credentials,
        }
    }
}
