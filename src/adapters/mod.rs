pub mod instance_lock;
pub mod json_settings_store;

pub use instance_lock::InstanceLock;
pub use json_settings_store::JsonSettingsStore;
