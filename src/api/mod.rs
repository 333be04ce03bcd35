pub mod handlers;
pub mod model;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use color_eyre::eyre::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::system::kill::ProcessController;
use crate::system::probe::{HardwareProbe, SysinfoProbe};
use crate::system::rate::RateComputer;
use crate::system::snapshot::SnapshotAggregator;

pub struct AppState {
    pub aggregator: SnapshotAggregator,
    pub controller: ProcessController,
}

impl AppState {
    pub fn new(probe: Arc<dyn HardwareProbe>, config: &Config) -> Self {
        AppState {
            aggregator: SnapshotAggregator::new(
                Arc::clone(&probe),
                RateComputer::new(config.sampling.negative_delta),
                config.sampling.cpu_window(),
            ),
            controller: ProcessController::from_config(probe, &config.kill),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(SysinfoProbe::new()), config)
    }
}

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/processes", get(handlers::processes))
        .route("/kill", post(handlers::kill))
        .route("/stats", get(handlers::stats))
        .route("/disk", get(handlers::disk))
        .route("/network", get(handlers::network))
        .route("/cpu", get(handlers::cpu))
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(server: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(server.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "server running");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
