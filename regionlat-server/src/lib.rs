use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use regionlat_common::{ErrorResponse, LatencyRequest, RegionLatError, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

pub mod aggregate;
pub mod config;
pub mod dataset;

use dataset::TelemetryTable;

/// Shared, immutable request state.
///
/// The table is loaded exactly once. A load failure is kept here instead of
/// aborting the process so every aggregation request can report it.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<Result<TelemetryTable>>,
    pub default_threshold_ms: f64,
}

impl AppState {
    pub fn loaded(table: TelemetryTable, default_threshold_ms: f64) -> Self {
        Self { table: Arc::new(Ok(table)), default_threshold_ms }
    }

    pub fn failed(error: RegionLatError, default_threshold_ms: f64) -> Self {
        Self { table: Arc::new(Err(error)), default_threshold_ms }
    }

    /// Load the dataset at `path`, logging the outcome.
    pub fn load(path: &Path, default_threshold_ms: f64) -> Self {
        match TelemetryTable::load(path) {
            Ok(table) => {
                if table.is_empty() {
                    warn!(path = %path.display(), "telemetry dataset is empty; latency requests will fail");
                } else {
                    info!(path = %path.display(), records = table.len(), "telemetry dataset loaded");
                }
                Self::loaded(table, default_threshold_ms)
            }
            Err(err) => {
                error!(path = %path.display(), %err, "failed to load telemetry dataset; latency requests will fail");
                Self::failed(err, default_threshold_ms)
            }
        }
    }

    /// The table to aggregate over, or the error every request must report.
    pub fn table(&self) -> Result<&TelemetryTable> {
        match self.table.as_ref() {
            Ok(table) => table.require_non_empty(),
            Err(err) => Err(err.clone()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub dataset: PathBuf,
    pub default_threshold_ms: f64,
}

/// RegionLat Server
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/latency", get(handle_get_latency).post(handle_post_latency))
            .layer(cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Load the dataset, then serve, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let state = AppState::load(&self.config.dataset, self.config.default_threshold_ms);
        let app = Self::create_router(state);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "accepting connections");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Any origin, any method, any header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

fn table_error_response(err: RegionLatError) -> Response {
    warn!(%err, "rejecting latency request");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Query string accepted by `GET /latency`.
#[derive(Debug, Default, Deserialize)]
pub struct LatencyQuery {
    pub threshold_ms: Option<f64>,
}

/// Handler for POST /latency — stats for each requested region at the given threshold.
pub async fn handle_post_latency(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LatencyRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            debug!(%rejection, "invalid latency request body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    if !request.threshold_ms.is_finite() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, RegionLatError::InvalidThreshold.to_string());
    }

    let table = match state.table() {
        Ok(table) => table,
        Err(err) => return table_error_response(err),
    };

    let report = aggregate::compute(table.records(), &request.regions, request.threshold_ms);
    debug!(regions = request.regions.len(), threshold_ms = request.threshold_ms, "computed latency report");
    (StatusCode::OK, Json(report)).into_response()
}

/// Handler for GET /latency — stats for every region in the dataset.
/// `?threshold_ms=` overrides the configured default threshold.
pub async fn handle_get_latency(
    State(state): State<AppState>,
    query: std::result::Result<Query<LatencyQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    let threshold_ms = query.threshold_ms.unwrap_or(state.default_threshold_ms);
    if !threshold_ms.is_finite() {
        return error_response(StatusCode::BAD_REQUEST, RegionLatError::InvalidThreshold.to_string());
    }

    let table = match state.table() {
        Ok(table) => table,
        Err(err) => return table_error_response(err),
    };

    let regions = table.regions();
    let report = aggregate::compute(table.records(), &regions, threshold_ms);
    debug!(regions = regions.len(), threshold_ms, "computed latency report for all regions");
    (StatusCode::OK, Json(report)).into_response()
}
