use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Threshold used by `GET /latency` when the caller does not supply one.
pub const DEFAULT_THRESHOLD_MS: f64 = 180.0;

/// Error types for RegionLat operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionLatError {
    #[error("Telemetry dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Malformed telemetry dataset: {0}")]
    MalformedDataset(String),

    #[error("Telemetry dataset is empty")]
    EmptyDataset,

    #[error("Threshold must be a finite number")]
    InvalidThreshold,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for RegionLat operations
pub type Result<T> = std::result::Result<T, RegionLatError>;

/// One latency/uptime observation tagged with a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub region: String,
    pub latency_ms: f64,
    pub uptime_pct: f64,
}

/// Body of `POST /latency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyRequest {
    pub regions: Vec<String>,
    pub threshold_ms: f64,
}

/// Aggregated statistics for a single region.
///
/// The three averages are either all present or all absent; a region with no
/// matching records always reports `breaches == 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub avg_latency: Option<f64>,
    pub p95_latency: Option<f64>,
    pub avg_uptime: Option<f64>,
    pub breaches: u64,
}

impl RegionStats {
    /// Stats for a region with no telemetry.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Region → stats mapping, keyed in first-query order.
///
/// Serializes as a JSON object. Re-inserting a region replaces its stats in place,
/// so the object never carries duplicate keys.
pub type LatencyReport = IndexMap<String, RegionStats>;
