//! HTTP client for the Experimentation Lab API.
//!
//! [`LabApi`] is the seam the rest of the engine is written against;
//! [`LabClient`] is the reqwest-backed implementation. Timeouts are the
//! client's business; nothing here retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{LabError, Result};
use crate::models::{Experiment, LabId, Listing, LogLine, Run, RunOutcome};

/// Remote operations the comparison engine consumes.
#[async_trait]
pub trait LabApi: Send + Sync {
    /// `GET /lab/runs?experiment_type=<t>`
    async fn list_runs(&self, experiment_type: Option<&str>) -> Result<Vec<Run>>;

    /// `GET /lab/runs/<id>`
    async fn get_run(&self, id: &LabId) -> Result<Run>;

    /// `GET /lab/runs/<id>/logs?limit=<n>`
    async fn run_logs(&self, id: &LabId, limit: usize) -> Result<Vec<LogLine>>;

    /// `GET /lab/experiments?experiment_type=<t>`
    async fn list_experiments(&self, experiment_type: Option<&str>) -> Result<Vec<Experiment>>;

    /// `POST /lab/experiments/<id>/run` with `{"params": ...}`
    async fn run_experiment(&self, id: &LabId, params: &Value) -> Result<RunOutcome>;
}

/// Connection settings for [`LabClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://127.0.0.1:8000/api`. Paths like `/lab/runs`
    /// are appended to it.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct LabClient {
    http: Client,
    base_url: Url,
}

impl LabClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| LabError::Other(format!("invalid API URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(LabError::Other(format!("invalid API URL {}", config.base_url)));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// The base URL with `segments` appended. Each segment is
    /// percent-encoded, so ids cannot escape their path slot.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LabError::Other(format!("invalid API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let url = self.url(segments)?;
        debug!(%url, ?query, "GET");
        let resp = self.http.get(url).query(query).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(LabError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn type_query(experiment_type: Option<&str>) -> Vec<(&'static str, String)> {
    experiment_type
        .filter(|t| !t.is_empty())
        .map(|t| vec![("experiment_type", t.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl LabApi for LabClient {
    async fn list_runs(&self, experiment_type: Option<&str>) -> Result<Vec<Run>> {
        let listing: Listing<Run> = self.get_json(&["lab", "runs"], &type_query(experiment_type)).await?;
        Ok(listing.into_vec())
    }

    async fn get_run(&self, id: &LabId) -> Result<Run> {
        self.get_json(&["lab", "runs", &id.key()], &[]).await
    }

    async fn run_logs(&self, id: &LabId, limit: usize) -> Result<Vec<LogLine>> {
        let listing: Listing<LogLine> = self
            .get_json(&["lab", "runs", &id.key(), "logs"], &[("limit", limit.to_string())])
            .await?;
        Ok(listing.into_vec())
    }

    async fn list_experiments(&self, experiment_type: Option<&str>) -> Result<Vec<Experiment>> {
        let listing: Listing<Experiment> = self
            .get_json(&["lab", "experiments"], &type_query(experiment_type))
            .await?;
        Ok(listing.into_vec())
    }

    async fn run_experiment(&self, id: &LabId, params: &Value) -> Result<RunOutcome> {
        let url = self.url(&["lab", "experiments", &id.key(), "run"])?;
        debug!(%url, "POST");
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({ "params": params }))
            .send()
            .await?;
        decode(resp).await
    }
}
