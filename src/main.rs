use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use careboard_core::EngineConfig;
use careboard_core::config::{ANALYSIS_TIMEOUT_ENV, PERSONA_DIR_ENV, RECORDS_ENV, REST_ADDR_ENV};

/// Main entry point for the Careboard application
///
/// Loads the persona registry and the records file, then serves the REST API.
///
/// # Environment Variables
/// - `CAREBOARD_RECORDS`: records file, JSON or YAML (default: "data/records.json")
/// - `CAREBOARD_PERSONA_DIR`: directory of persona YAML files (default: built-in personas)
/// - `CAREBOARD_ANALYSIS_TIMEOUT_SECS`: analysis timeout in seconds (default: 30)
/// - `CAREBOARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("careboard=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env_values(
        std::env::var(RECORDS_ENV).ok(),
        std::env::var(PERSONA_DIR_ENV).ok(),
        std::env::var(ANALYSIS_TIMEOUT_ENV).ok(),
        std::env::var(REST_ADDR_ENV).ok(),
    )?;
    tracing::info!(
        "++ Records: {}, analysis timeout: {:?}",
        config.records_path().display(),
        config.analysis_timeout()
    );

    api_rest::serve(&config).await
}
