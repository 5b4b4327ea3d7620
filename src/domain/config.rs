use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Static information about the application.
pub struct AppInfo;

impl AppInfo {
    pub const NAME: &'static str = "Splasher";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
    /// Directory name used under the per-user config and cache roots.
    pub const DIR: &'static str = "splasher";
}

/// File name of the settings file inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// File name of the optional logging configuration inside the config directory.
pub const LOGGING_FILE: &str = "logging.toml";

/// Resolved once per process by [`AppPaths::global`].
static PATHS: OnceCell<AppPaths> = OnceCell::new();

/// Filesystem locations owned by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Configuration directory (~/.config/splasher/).
    pub config_dir: PathBuf,
    /// Cache directory (~/.cache/splasher/).
    pub cache_dir: PathBuf,
    /// Cache subfolder for the image source.
    pub cache_subfolder: String,
    /// Directory where downloaded backgrounds are kept (~/Pictures/splasher_background/).
    pub background_dir: PathBuf,
    /// Log directory.
    pub logs_dir: PathBuf,
    /// Single-instance lock file.
    pub app_lock: PathBuf,
}

impl AppPaths {
    /// Get the process-wide paths, resolving them on first use.
    pub fn global() -> Result<&'static AppPaths, DomainError> {
        PATHS.get_or_try_init(Self::resolve)
    }

    /// Resolve the OS-specific application directories.
    /// - Linux: ~/.config/splasher/, ~/.cache/splasher/, ~/.local/share/splasher/logs/
    pub fn resolve() -> Result<Self, DomainError> {
        let config_root = dirs::config_dir()
            .ok_or_else(|| DomainError::Config("Could not find configuration directory".to_string()))?;
        let cache_root = dirs::cache_dir()
            .ok_or_else(|| DomainError::Config("Could not find cache directory".to_string()))?;
        let pictures_root = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Pictures")))
            .ok_or_else(|| DomainError::Config("Could not find pictures directory".to_string()))?;
        let logs_dir = dirs::data_dir()
            .map(|p| p.join(AppInfo::DIR).join("logs"))
            .unwrap_or_else(|| config_root.join(AppInfo::DIR).join("logs"));

        Ok(Self {
            config_dir: config_root.join(AppInfo::DIR),
            cache_dir: cache_root.join(AppInfo::DIR),
            cache_subfolder: "unsplash".to_string(),
            background_dir: pictures_root.join("splasher_background"),
            logs_dir,
            app_lock: std::env::temp_dir().join(format!("{}.lock", AppInfo::DIR)),
        })
    }

    /// Lay out every application directory under a single root.
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            cache_subfolder: "unsplash".to_string(),
            background_dir: root.join("background"),
            logs_dir: root.join("logs"),
            app_lock: root.join(format!("{}.lock", AppInfo::DIR)),
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    pub fn logging_file(&self) -> PathBuf {
        self.config_dir.join(LOGGING_FILE)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

impl LoggingConfig {
    /// Configuration used when the logging file cannot be loaded.
    pub fn fallback() -> Self {
        Self {
            level: "warn".to_string(),
            ..Self::default()
        }
    }

    /// Load the logging configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let content = fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }
}
