use api_rest::serve;
use careboard_core::config::{ANALYSIS_TIMEOUT_ENV, PERSONA_DIR_ENV, RECORDS_ENV, REST_ADDR_ENV};
use careboard_core::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Standalone REST server for the Careboard dashboard engine
///
/// # Environment Variables
/// - `CAREBOARD_RECORDS`: records file, JSON or YAML (default: "data/records.json")
/// - `CAREBOARD_PERSONA_DIR`: directory of persona YAML files (default: built-in personas)
/// - `CAREBOARD_ANALYSIS_TIMEOUT_SECS`: analysis timeout in seconds (default: 30)
/// - `CAREBOARD_REST_ADDR`: listen address (default: "0.0.0.0:3000")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("careboard=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env_values(
        std::env::var(RECORDS_ENV).ok(),
        std::env::var(PERSONA_DIR_ENV).ok(),
        std::env::var(ANALYSIS_TIMEOUT_ENV).ok(),
        std::env::var(REST_ADDR_ENV).ok(),
    )?;

    serve(&config).await
}
