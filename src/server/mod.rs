//! JSON API over the aggregator.

pub mod routes;

use crate::aggregator::RateAggregator;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state. Cloned per request; the aggregator is shared.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<RateAggregator>,
    pub domestic: String,
}

impl AppState {
    pub fn new(aggregator: Arc<RateAggregator>, domestic: &str) -> Self {
        AppState {
            aggregator,
            domestic: domestic.to_uppercase(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/rates",
            get(routes::get_rates).post(routes::convert_amount),
        )
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `server.host:server.port` and serves until Ctrl+C.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let aggregator = Arc::new(RateAggregator::from_config(config));
    let app = router(AppState::new(aggregator, &config.domestic_currency));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Rate service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
