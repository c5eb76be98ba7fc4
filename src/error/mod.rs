//! Error handling module

mod types;

pub use types::SettingsError;

/// Result alias used throughout the settings loader
pub type Result<T, E = SettingsError> = std::result::Result<T, E>;
