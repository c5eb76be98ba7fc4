//! FacePay Settings
//!
//! Loads the backend settings exactly as the service does at startup and
//! prints the effective (redacted) configuration.

use anyhow::{Context, Result};
use clap::Parser;
use facepay_settings::config::{Environment, Settings, SettingsLoader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// FacePay Settings
///
/// Resolve and validate the backend configuration.
#[derive(Parser, Debug)]
#[command(name = "facepay-settings")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Environment: dev, staging, prod (overrides APP_ENV env var)
    #[arg(short, long)]
    env: Option<Environment>,

    /// Directory containing the .env.<environment> files
    #[arg(long, default_value = ".")]
    env_dir: PathBuf,

    /// Secrets Manager secret to layer on top (overrides SETTINGS_SECRET_NAME)
    #[arg(long)]
    secret_name: Option<String>,

    /// Region of the secret (overrides SETTINGS_SECRET_REGION)
    #[arg(long)]
    secret_region: Option<String>,

    /// Seconds to wait for the secret fetch (overrides SETTINGS_SECRET_TIMEOUT_SECS)
    #[arg(long)]
    secret_timeout: Option<u64>,

    /// Log level: trace, debug, info, warn, error (RUST_LOG wins when set)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Only print the CORS origins
    #[arg(long)]
    show_cors: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let mut loader = SettingsLoader::from_process_env().env_dir(&args.env_dir);
    if let Some(env) = args.env {
        loader = loader.environment(env);
    }
    if let Some(name) = args.secret_name {
        loader = loader.secret_name(name);
    }
    if let Some(region) = args.secret_region {
        loader = loader.secret_region(region);
    }
    if let Some(secs) = args.secret_timeout {
        loader = loader.secret_timeout(Duration::from_secs(secs));
    }

    let settings: Arc<Settings> = Arc::new(loader.load().await.context("Failed to load settings")?);

    tracing::info!(
        environment = %settings.environment,
        aws_region = %settings.aws_region,
        cors_origins = ?settings.cors_origins(),
        "Settings ready"
    );

    if args.show_cors {
        for origin in settings.cors_origins() {
            println!("{}", origin);
        }
    } else {
        let rendered =
            serde_json::to_string_pretty(settings.as_ref()).context("Failed to render settings")?;
        println!("{}", rendered);
    }

    Ok(())
}

/// Initialize tracing subscriber with the specified log level.
/// Logs go to stderr as JSON so stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let console_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).init();
}
