use anyhow::Context;
use pnlshare::{api, config::Config, HttpDataSource, PositionService};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let datasource = Arc::new(
        HttpDataSource::new(
            config.price_api_url.clone(),
            config.price_api_key.clone(),
            config.oracle_timeout(),
        )
        .context("Failed to build data provider client")?,
    );
    let positions = Arc::new(PositionService::new(
        datasource.clone(),
        datasource,
        config.matching_mode,
        config.lookup_timeout(),
    ));

    let port = config.port;
    tracing::info!(
        policy = config.default_policy.name(),
        matching_mode = ?config.matching_mode,
        "Starting pnlshare"
    );

    let app = api::create_router(api::AppState::new(config, positions));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
