pub mod config;
pub mod error;
pub mod settings;

pub use config::{AppInfo, AppPaths, LoggingConfig};
pub use error::DomainError;
pub use settings::{SettingValue, SettingsDocument, CNM, PREVIEW};
