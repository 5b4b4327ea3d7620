use std::path::PathBuf;

use thiserror::Error;

/// Domain-level errors for Splasher.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Settings file not found: {path:?}")]
    SettingsNotFound { path: PathBuf },

    #[error("Failed to open {path:?}: {reason}")]
    SettingsOpen { path: PathBuf, reason: String },

    #[error("Failed to parse {path:?}: {reason}")]
    SettingsParse { path: PathBuf, reason: String },

    #[error("Settings file {path:?} is empty")]
    SettingsEmpty { path: PathBuf },

    #[error("Key: {key} does not exist in {path:?}")]
    KeyNotRecognized { key: String, path: PathBuf },

    #[error("Failed to write {path:?}: {reason}")]
    SettingsWrite { path: PathBuf, reason: String },

    #[error("Failed to create {path:?}: {reason}")]
    SettingsCreate { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("The application is already running{}", owner_suffix(.pid))]
    AlreadyRunning { pid: Option<u32> },
}

impl DomainError {
    /// Whether the settings file content could not be turned into a document,
    /// including the case of an empty file.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            DomainError::SettingsParse { .. } | DomainError::SettingsEmpty { .. }
        )
    }
}

fn owner_suffix(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" (pid {})", p)).unwrap_or_default()
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
