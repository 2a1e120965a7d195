use tracing::info;
use tracing_subscriber::EnvFilter;

use currency_converter::{
    api,
    config::{self, AppEnv},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize logging
    let default_level = match config.app_env {
        AppEnv::Production => "info",
        AppEnv::Development | AppEnv::Test => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        rates_api_url = %config.rates_api_url,
        timeout = ?config.rates_timeout,
        "Using exchange rate provider"
    );

    // Build our application with routes
    let app = api::router::create_router(&config)?;

    // Run our application
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Currency converter listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
