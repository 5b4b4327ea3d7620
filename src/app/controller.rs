use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{InstanceLock, JsonSettingsStore};
use crate::domain::{AppInfo, AppPaths, DomainError, SettingValue, SettingsDocument, CNM, PREVIEW};
use crate::infrastructure::{create_folders, init_logging, load_logging_config};
use crate::ports::SettingsStore;

/// Application controller that runs the startup sequence and hands out the
/// settings store to the GUI and network layers.
pub struct AppController {
    paths: AppPaths,
    settings: JsonSettingsStore,
    _instance_lock: InstanceLock,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize the application using the per-user directories.
    pub fn new() -> Result<Self, DomainError> {
        Self::with_paths(AppPaths::global()?.clone())
    }

    /// Initialize the application rooted at `paths`.
    /// This creates the folders, sets up logging, creates the settings file
    /// and claims the single-instance lock.
    pub fn with_paths(paths: AppPaths) -> Result<Self, DomainError> {
        // Step 1: Folders
        create_folders(&paths)?;

        // Step 2: Logging
        let (logging, fallback) = load_logging_config(&paths.logging_file());
        let log_guard = init_logging(&paths.logs_dir, &logging)?;
        if let Some(msg) = fallback {
            error!("{}", msg);
        }

        info!(version = AppInfo::VERSION, "{} starting up", AppInfo::NAME);

        // Step 3: Settings
        let settings = JsonSettingsStore::new(paths.settings_file());
        settings.initialize(&SettingsDocument::defaults())?;

        // Step 4: Single instance
        let instance_lock = InstanceLock::try_acquire(&paths.app_lock)?;

        info!(settings = ?settings.settings_path(), "AppController initialized");

        Ok(Self {
            paths,
            settings,
            _instance_lock: instance_lock,
            _log_guard: log_guard,
        })
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// The settings store. Clones share the same lock.
    pub fn settings(&self) -> &JsonSettingsStore {
        &self.settings
    }

    /// Create the settings file if it is missing.
    pub fn create_settings(&self) -> Result<(), DomainError> {
        self.settings.initialize(&SettingsDocument::defaults())
    }

    /// Get the value of a settings key.
    pub fn get_settings_arg(&self, key: &str) -> Option<SettingValue> {
        self.settings.get(key)
    }

    /// Replace the value of an existing settings key.
    pub fn set_settings_arg(&self, key: &str, value: impl Into<SettingValue>) -> bool {
        self.settings.set(key, value.into())
    }

    /// Sub-path of the image to preview, if one has been downloaded.
    pub fn preview(&self) -> Option<String> {
        match self.settings.get(PREVIEW)? {
            SettingValue::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn set_preview(&self, sub_path: &str) -> bool {
        self.set_settings_arg(PREVIEW, sub_path)
    }

    /// Whether image requests should go through the mirror.
    pub fn use_mirror(&self) -> bool {
        matches!(self.settings.get(CNM), Some(SettingValue::Bool(true)))
    }

    pub fn set_use_mirror(&self, use_mirror: bool) -> bool {
        self.set_settings_arg(CNM, use_mirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_startup_sequence_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());

        let controller = AppController::with_paths(paths.clone()).unwrap();

        assert!(paths.cache_dir.join("unsplash").is_dir());
        assert!(paths.background_dir.is_dir());
        assert!(paths.app_lock.exists());
        assert_eq!(controller.settings().read_settings().unwrap(), SettingsDocument::defaults());

        drop(controller);
        assert!(InstanceLock::try_acquire(&paths.app_lock).is_ok());
    }

    #[test]
    fn test_restart_keeps_user_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());

        let controller = AppController::with_paths(paths.clone()).unwrap();
        assert!(controller.set_preview("unsplash/abc.jpg"));
        drop(controller);

        let controller = AppController::with_paths(paths).unwrap();
        assert_eq!(controller.preview().as_deref(), Some("unsplash/abc.jpg"));
    }

    #[test]
    fn test_typed_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let controller = AppController::with_paths(AppPaths::with_root(dir.path())).unwrap();

        assert_eq!(controller.preview(), None);
        assert!(!controller.use_mirror());

        assert!(controller.set_use_mirror(true));
        assert!(controller.use_mirror());
        assert_eq!(controller.get_settings_arg(CNM), Some(json!(true)));

        assert!(!controller.set_settings_arg("SOURCE", "unsplash"));
        assert_eq!(controller.get_settings_arg("SOURCE"), None);
    }

    #[test]
    fn test_second_instance_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_root(dir.path());

        let _first = AppController::with_paths(paths.clone()).unwrap();
        let second = AppController::with_paths(paths.clone());
        assert!(matches!(second, Err(DomainError::AlreadyRunning { .. })));
        assert!(paths.app_lock.exists());
    }
}
