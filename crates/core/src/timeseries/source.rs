//! Query execution against the time-series engine.

use super::query::FluxQuery;
use super::record::{AnnotatedCsvReader, FluxRecord};
use crate::config::InfluxSettings;
use crate::error::TimeSeriesError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::io::Cursor;

/// Lazy sequence of records produced by one query.
pub type FluxRecords = Box<dyn Iterator<Item = Result<FluxRecord, TimeSeriesError>> + Send>;

/// Something that can run a Flux query.
///
/// Implementations must not retry. Dropping the returned future aborts the request.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn query(&self, query: &FluxQuery) -> Result<FluxRecords, TimeSeriesError>;
}

/// InfluxDB v2 HTTP client.
///
/// Wraps a pooled `reqwest::Client`; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: String,
}

impl InfluxClient {
    pub fn new(settings: &InfluxSettings) -> Result<Self, TimeSeriesError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            org: settings.org.clone(),
        })
    }

    /// Probe the engine's `/health` endpoint and return its reported status.
    pub async fn health(&self) -> Result<String, TimeSeriesError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TimeSeriesError::Status {
                status: status.as_u16(),
                message: engine_message(&body),
            });
        }

        Ok(serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(str::to_string))
            .unwrap_or_else(|| "unknown".into()))
    }
}

/// Pull the `message` out of an engine error body, falling back to the raw text.
fn engine_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl TelemetrySource for InfluxClient {
    async fn query(&self, query: &FluxQuery) -> Result<FluxRecords, TimeSeriesError> {
        tracing::debug!(query = %query, "running flux query");

        let response = self
            .http
            .post(format!("{}/api/v2/query", self.base_url))
            .query(&[("org", self.org.as_str())])
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "application/vnd.flux")
            .header(ACCEPT, "application/csv")
            .body(query.as_str().to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TimeSeriesError::Status {
                status: status.as_u16(),
                message: engine_message(&body),
            });
        }

        let body = response.bytes().await?;
        Ok(Box::new(AnnotatedCsvReader::new(Cursor::new(body))))
    }
}
