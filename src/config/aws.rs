//! AWS SDK configuration
//!
//! Builds the SDK configuration used by the Secrets Manager client,
//! supporting custom endpoints for local development and testing.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::config::Credentials;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;

/// Static credentials handed to the SDK instead of the default chain
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// AWS configuration builder
///
/// Creates AWS SDK configuration with support for:
/// - An explicit region
/// - Static credentials, or the default credential chain when none are given
/// - A custom endpoint URL for LocalStack
#[derive(Debug, Clone)]
pub struct AwsConfigBuilder {
    region: String,
    endpoint_url: Option<String>,
    credentials: Option<StaticCredentials>,
}

impl AwsConfigBuilder {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            credentials: None,
        }
    }

    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<StaticCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Build the base AWS SDK configuration
    pub async fn build_sdk_config(&self) -> SdkConfig {
        let region_provider =
            RegionProviderChain::first_try(Region::new(self.region.clone())).or_default_provider();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

        if let Some(creds) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                None,
                None,
                "facepay-settings",
            ));
        }

        loader.load().await
    }

    /// Create a Secrets Manager client with optional custom endpoint
    pub async fn build_secrets_manager_client(&self) -> SecretsManagerClient {
        let sdk_config = self.build_sdk_config().await;

        if let Some(endpoint_url) = &self.endpoint_url {
            tracing::info!(endpoint = %endpoint_url, "Using custom Secrets Manager endpoint");

            let config = aws_sdk_secretsmanager::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint_url)
                .build();

            SecretsManagerClient::from_conf(config)
        } else {
            SecretsManagerClient::new(&sdk_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_sdk_config_uses_region() {
        let config = AwsConfigBuilder::new("eu-west-2").build_sdk_config().await;
        assert_eq!(config.region().unwrap().as_ref(), "eu-west-2");
    }

    #[tokio::test]
    async fn test_static_credentials_are_installed() {
        let config = AwsConfigBuilder::new("eu-west-2")
            .with_credentials(Some(StaticCredentials {
                access_key_id: "AKIATEST".to_string(),
                secret_access_key: "secret".to_string(),
            }))
            .build_sdk_config()
            .await;
        assert!(config.credentials_provider().is_some());
    }

    #[tokio::test]
    async fn test_custom_endpoint_client() {
        let _client = AwsConfigBuilder::new("eu-west-2")
            .with_endpoint_url(Some("http://localhost:4566".to_string()))
            .build_secrets_manager_client()
            .await;
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let creds = StaticCredentials {
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "very-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("AKIATEST"));
        assert!(!rendered.contains("very-secret"));
    }
}
