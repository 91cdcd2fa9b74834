use std::sync::Arc;

use anyhow::Context;
use genre_recommender::{
    api::{create_router, AppState},
    config::Config,
    services::CsvCatalogSource,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("genre_recommender=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Build the model before binding, an unusable catalog aborts startup
    let source = Arc::new(CsvCatalogSource::new(config.catalog_path.clone()));
    let state = AppState::bootstrap(source, config.recommendation_settings())
        .await
        .with_context(|| {
            format!(
                "failed to build recommendation model from {}",
                config.catalog_path.display()
            )
        })?;

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
