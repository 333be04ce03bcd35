use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::system::process::ProcessOrder;
use crate::system::snapshot::{CpuSnapshot, DiskReport, NetworkSnapshot, StatsSnapshot};

use super::AppState;
use super::model::{ErrorBody, Health, KillRequest, KillResponse, ProcessQuery, ProcessView};

/// A handler whose blocking work never completed.
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody { error: self.0 }),
        )
            .into_response()
    }
}

/// Probe reads and kill commands block, so they run off the async workers.
async fn run_blocking<T, F>(state: Arc<AppState>, f: F) -> Result<Json<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map(Json)
        .map_err(|e| ApiError(format!("worker failed: {e}")))
}

pub async fn healthcheck() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn processes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<Vec<ProcessView>>, ApiError> {
    let order = query
        .sort
        .as_deref()
        .and_then(ProcessOrder::from_query)
        .unwrap_or_default();
    run_blocking(state, move |s| {
        s.controller
            .list_processes(order)
            .iter()
            .map(ProcessView::from)
            .collect()
    })
    .await
}

pub async fn kill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KillRequest>,
) -> Result<Json<KillResponse>, ApiError> {
    tracing::info!(pid = request.pid, "kill requested");
    run_blocking(state, move |s| {
        KillResponse::from(s.controller.terminate(request.pid))
    })
    .await
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsSnapshot>, ApiError> {
    run_blocking(state, |s| s.aggregator.stats()).await
}

pub async fn disk(State(state): State<Arc<AppState>>) -> Result<Json<DiskReport>, ApiError> {
    run_blocking(state, |s| s.aggregator.disk()).await
}

pub async fn network(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NetworkSnapshot>, ApiError> {
    run_blocking(state, |s| s.aggregator.network()).await
}

pub async fn cpu(State(state): State<Arc<AppState>>) -> Result<Json<CpuSnapshot>, ApiError> {
    run_blocking(state, |s| s.aggregator.cpu()).await
}
