use std::path::Path;

use crate::domain::{DomainError, SettingValue, SettingsDocument};

/// Settings store port: a closed set of keys whose values can be read and replaced.
pub trait SettingsStore: Send + Sync {
    /// Path of the backing settings file.
    fn settings_path(&self) -> &Path;

    /// Create the settings file from `defaults` unless it already exists.
    /// Calling this more than once never overwrites existing settings.
    fn initialize(&self, defaults: &SettingsDocument) -> Result<(), DomainError>;

    /// Load the whole settings document.
    fn read_settings(&self) -> Result<SettingsDocument, DomainError>;

    /// Look up one key.
    fn try_get(&self, key: &str) -> Result<SettingValue, DomainError>;

    /// Replace the value of an existing key and persist the document.
    fn try_set(&self, key: &str, value: SettingValue) -> Result<(), DomainError>;

    /// Look up one key, logging and swallowing any failure.
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.try_get(key).ok()
    }

    /// Replace one value, logging and swallowing any failure.
    fn set(&self, key: &str, value: SettingValue) -> bool {
        self.try_set(key, value).is_ok()
    }
}
