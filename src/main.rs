//! MCC/MNC Lookup Service - Main Entry Point
//!
//! Runs either the lookup server or a one-shot caller, selected by `MODE`.

use tracing::{error, info};

use mccmnc_lookup::config::{Config, Mode};
use mccmnc_lookup::observability::{init_tracing, TracingConfig};
use mccmnc_lookup::runner::{run_client, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&TracingConfig::from_config(&config))?;

    info!(mode = ?config.mode, "Starting MCC/MNC lookup service");

    let result = match config.mode {
        Mode::Server => run_server(&config).await,
        Mode::Client => run_client(&config, &mut std::io::stdout()).await,
    };

    if let Err(err) = &result {
        error!(error = %err, error_code = err.code().as_str(), "MCC/MNC lookup service failed");
    }
    result?;

    info!("MCC/MNC lookup service stopped");
    Ok(())
}
