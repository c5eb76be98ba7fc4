//! Configuration management module
//!
//! Loads the backend settings from, in increasing precedence:
//! hardcoded defaults, `.env.<environment>`, process environment variables,
//! and an optional AWS Secrets Manager secret.

pub mod aws;
pub mod loader;
pub mod secrets;
pub mod settings;
pub mod sources;

pub use aws::{AwsConfigBuilder, StaticCredentials};
pub use loader::SettingsLoader;
pub use secrets::{parse_secret_blob, AwsSecretsManager, SecretBlob, SecretStore};
pub use settings::{keys, Environment, MtlsPaths, Settings};
pub use sources::{LayerKind, LayeredSource, SourceLayer};
