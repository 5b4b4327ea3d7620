#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use adapters::{InstanceLock, JsonSettingsStore};
pub use app::AppController;
pub use domain::{AppInfo, AppPaths, DomainError, LoggingConfig, SettingValue, SettingsDocument};
pub use ports::SettingsStore;

/// Prepare the environment the GUI needs: folders, logging, the settings
/// file and the single-instance lock.
///
/// The application cannot run without these, so any failure is reported and
/// the process exits.
pub fn init_app() -> AppController {
    match AppController::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
