use regionlat_common::{ErrorResponse, LatencyReport, LatencyRequest, RegionLatError, Result};
use serde::Serialize;

/// RegionLat client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
}

/// RegionLat Client
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct ThresholdQuery {
    threshold_ms: f64,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// URL of the latency endpoint on the configured server.
    pub fn latency_url(&self) -> String {
        format!("{}/latency", self.config.base_url.trim_end_matches('/'))
    }

    /// Stats for each of `regions` at `threshold_ms`, in request order.
    /// A non-finite threshold is rejected without contacting the server.
    pub async fn latency(&self, regions: &[&str], threshold_ms: f64) -> Result<LatencyReport> {
        if !threshold_ms.is_finite() {
            return Err(RegionLatError::InvalidThreshold);
        }

        let body = LatencyRequest {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            threshold_ms,
        };

        let response = self
            .http_client
            .post(self.latency_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RegionLatError::NetworkError(e.to_string()))?;

        parse_report(response).await
    }

    /// Stats for every region in the server's dataset at the server's default threshold.
    pub async fn latency_all(&self) -> Result<LatencyReport> {
        self.latency_all_impl(None).await
    }

    /// Stats for every region in the server's dataset at `threshold_ms`.
    pub async fn latency_all_with_threshold(&self, threshold_ms: f64) -> Result<LatencyReport> {
        if !threshold_ms.is_finite() {
            return Err(RegionLatError::InvalidThreshold);
        }
        self.latency_all_impl(Some(threshold_ms)).await
    }

    async fn latency_all_impl(&self, threshold_ms: Option<f64>) -> Result<LatencyReport> {
        let mut request = self.http_client.get(self.latency_url());
        if let Some(threshold_ms) = threshold_ms {
            request = request.query(&ThresholdQuery { threshold_ms });
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegionLatError::NetworkError(e.to_string()))?;

        parse_report(response).await
    }
}

async fn parse_report(response: reqwest::Response) -> Result<LatencyReport> {
    let status = response.status();
    if !status.is_success() {
        return Err(parse_error_response(status, response).await);
    }

    response
        .json::<LatencyReport>()
        .await
        .map_err(|e| RegionLatError::InvalidResponse(e.to_string()))
}

async fn parse_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> RegionLatError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    RegionLatError::HttpError(status.as_u16(), error_msg)
}
