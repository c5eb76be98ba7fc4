//! Settings loader
//!
//! Resolves the environment, stacks the sources in precedence order
//! (env file < process environment < secret blob), and builds [`Settings`].
//! Any failure aborts the load; there is no partial result.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::aws::StaticCredentials;
use crate::config::secrets::{AwsSecretsManager, SecretStore};
use crate::config::settings::{keys, Environment, Settings, APP_ENV_KEY, DEFAULT_AWS_REGION};
use crate::config::sources::{LayeredSource, SourceLayer};
use crate::error::{Result, SettingsError};
use crate::utils::{with_timeout, TimeoutConfig, TimeoutError};

/// Builder for a single settings load
pub struct SettingsLoader {
    process_env: BTreeMap<String, String>,
    env_dir: PathBuf,
    environment: Option<Environment>,
    secret_name: Option<String>,
    secret_region: Option<String>,
    secret_timeout: Option<Duration>,
    secret_store: Option<Arc<dyn SecretStore>>,
}

impl SettingsLoader {
    /// Create a loader over a snapshot of environment variables
    pub fn new(process_env: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            process_env: process_env.into_iter().collect(),
            env_dir: PathBuf::from("."),
            environment: None,
            secret_name: None,
            secret_region: None,
            secret_timeout: None,
            secret_store: None,
        }
    }

    /// Create a loader over the current process environment.
    ///
    /// Variables that are not valid unicode are skipped.
    pub fn from_process_env() -> Self {
        Self::new(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Directory holding the `.env.<environment>` files
    pub fn env_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.env_dir = dir.into();
        self
    }

    /// Override `APP_ENV`
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Enable the secret layer, overriding `SETTINGS_SECRET_NAME`
    pub fn secret_name(mut self, name: impl Into<String>) -> Self {
        self.secret_name = Some(name.into());
        self
    }

    /// Override `SETTINGS_SECRET_REGION`
    pub fn secret_region(mut self, region: impl Into<String>) -> Self {
        self.secret_region = Some(region.into());
        self
    }

    /// Override `SETTINGS_SECRET_TIMEOUT_SECS`
    pub fn secret_timeout(mut self, timeout: Duration) -> Self {
        self.secret_timeout = Some(timeout);
        self
    }

    /// Use a specific secret store instead of AWS Secrets Manager
    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Run the load
    pub async fn load(self) -> Result<Settings> {
        let environment = match self.environment {
            Some(environment) => environment,
            None => match self.process_env.get(APP_ENV_KEY).filter(|v| !v.trim().is_empty()) {
                Some(raw) => raw.parse()?,
                None => Environment::default(),
            },
        };

        let env_file = self.env_dir.join(environment.env_file_name());
        tracing::info!(
            environment = %environment,
            env_file = %env_file.display(),
            "Loading settings"
        );

        let mut sources = LayeredSource::new();
        if let Some(layer) = SourceLayer::from_env_file(&env_file)? {
            sources.push(layer);
        }
        sources.push(SourceLayer::from_process_env(self.process_env));

        let secret_name = self
            .secret_name
            .or_else(|| sources.get(keys::SETTINGS_SECRET_NAME).map(str::to_string));

        if let Some(name) = secret_name {
            let region = self
                .secret_region
                .or_else(|| sources.get(keys::SETTINGS_SECRET_REGION).map(str::to_string))
                .or_else(|| sources.get(keys::AWS_REGION).map(str::to_string))
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());

            let timeout = match self.secret_timeout {
                Some(timeout) => timeout,
                None => secret_timeout_from(&sources)?,
            };

            let store: Arc<dyn SecretStore> = match self.secret_store {
                Some(store) => store,
                None => Arc::new(default_secret_store(&sources)),
            };

            let blob = fetch_with_timeout(store.as_ref(), &name, &region, timeout).await?;
            sources.push(SourceLayer::from_secret_blob(&name, blob)?);
        }

        let settings = Settings::from_sources(environment, &sources)?;

        tracing::info!(
            environment = %settings.environment,
            aws_region = %settings.aws_region,
            metrics_enabled = settings.metrics_enabled,
            mtls_enabled = settings.mtls_enabled,
            extra_keys = settings.extra.len(),
            "Settings loaded"
        );

        Ok(settings)
    }
}

fn secret_timeout_from(sources: &LayeredSource) -> Result<Duration> {
    match sources.get(keys::SETTINGS_SECRET_TIMEOUT_SECS) {
        None => Ok(TimeoutConfig::default().secret_fetch_timeout),
        Some(raw) => TimeoutConfig::parse_secs(raw).ok_or_else(|| SettingsError::TypeCoercion {
            field: keys::SETTINGS_SECRET_TIMEOUT_SECS.to_string(),
            value: format!("'{}'", raw),
            expected: "a positive number of seconds",
        }),
    }
}

/// AWS store configured from the lower layers.
///
/// Credentials found in the env file or environment are passed explicitly,
/// so a file-only setup can still authenticate.
fn default_secret_store(sources: &LayeredSource) -> AwsSecretsManager {
    let credentials = match (
        sources.get(keys::AWS_ACCESS_KEY_ID),
        sources.get(keys::AWS_SECRET_ACCESS_KEY),
    ) {
        (Some(id), Some(secret)) => Some(StaticCredentials {
            access_key_id: id.to_string(),
            secret_access_key: secret.to_string(),
        }),
        _ => None,
    };

    AwsSecretsManager::new()
        .with_endpoint_url(sources.get(keys::SECRETS_MANAGER_ENDPOINT_URL).map(str::to_string))
        .with_credentials(credentials)
}

async fn fetch_with_timeout(
    store: &dyn SecretStore,
    name: &str,
    region: &str,
    timeout: Duration,
) -> Result<serde_json::Map<String, serde_json::Value>> {
    match with_timeout(timeout, store.fetch_secret_blob(name, region)).await {
        Ok(blob) => {
            tracing::debug!(secret = %name, keys = blob.len(), "Fetched settings secret");
            Ok(blob)
        }
        Err(TimeoutError::Timeout(elapsed)) => {
            tracing::error!(secret = %name, region = %region, timeout = ?elapsed, "Secret fetch timed out");
            Err(SettingsError::source_unavailable(
                format!("secretsmanager:{}", name),
                format!("timed out after {:?}", elapsed),
            ))
        }
        Err(TimeoutError::Inner(err)) => {
            tracing::error!(secret = %name, region = %region, error = %err, "Secret fetch failed");
            Err(err)
        }
    }
}

impl Settings {
    /// Load settings from the process environment, the env file for
    /// `APP_ENV`, and the secret named by `SETTINGS_SECRET_NAME` if set
    pub async fn load() -> Result<Self> {
        SettingsLoader::from_process_env().load().await
    }
}
