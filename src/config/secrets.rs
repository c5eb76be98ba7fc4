//! Remote secret store
//!
//! The loader only needs one operation from the secret store: fetch a named
//! JSON object in a region. [`SecretStore`] is that seam; [`AwsSecretsManager`]
//! is the production implementation.

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde_json::{Map, Value};

use crate::config::aws::{AwsConfigBuilder, StaticCredentials};
use crate::error::{Result, SettingsError};

/// Decoded secret blob
pub type SecretBlob = Map<String, Value>;

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch and decode the secret `name` stored in `region`
    async fn fetch_secret_blob(&self, name: &str, region: &str) -> Result<SecretBlob>;
}

/// Decode a secret string into a JSON object
pub fn parse_secret_blob(name: &str, raw: &str) -> Result<SecretBlob> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| SettingsError::malformed_secret(name, format!("invalid JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(SettingsError::malformed_secret(
            name,
            format!("expected a JSON object, got {}", json_type_name(&other)),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// AWS Secrets Manager backed store
#[derive(Debug, Clone, Default)]
pub struct AwsSecretsManager {
    endpoint_url: Option<String>,
    credentials: Option<StaticCredentials>,
}

impl AwsSecretsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom endpoint (LocalStack)
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    /// Authenticate with explicit credentials instead of the default chain
    pub fn with_credentials(mut self, credentials: Option<StaticCredentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManager {
    async fn fetch_secret_blob(&self, name: &str, region: &str) -> Result<SecretBlob> {
        let client = AwsConfigBuilder::new(region)
            .with_endpoint_url(self.endpoint_url.clone())
            .with_credentials(self.credentials.clone())
            .build_secrets_manager_client()
            .await;

        tracing::info!(secret = %name, region = %region, "Fetching settings secret");

        let output = client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                SettingsError::source_unavailable(
                    format!("secretsmanager:{}", name),
                    DisplayErrorContext(&e),
                )
            })?;

        let raw = output.secret_string().ok_or_else(|| {
            SettingsError::malformed_secret(name, "secret has no SecretString (binary secrets are not supported)")
        })?;

        parse_secret_blob(name, raw)
    }
}
