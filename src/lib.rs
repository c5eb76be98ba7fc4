//! FacePay backend settings loader

pub mod config;
pub mod error;
pub mod utils;

pub use config::{Settings, SettingsLoader};
pub use error::SettingsError;
