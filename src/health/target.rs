//! Live target health queries.
//!
//! # Responsibilities
//! - Describe the health of one (target, port) in a target group
//! - Bound every call with the configured timeout
//! - Surface failures as errors; an empty answer is not a failure
//!
//! # Design Decisions
//! - No retries here; a failed pass is retried on the next cycle
//! - Client reads endpoint/timeout from the live config on every call

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::SharedConfig;
use crate::observability::metrics;

/// Errors from the live target health API.
#[derive(Debug, Error)]
pub enum TargetHealthError {
    /// Endpoint URL in config could not be parsed.
    #[error("invalid target health endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Request did not complete in time.
    #[error("target health request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection or protocol failure.
    #[error("target health transport error: {0}")]
    Transport(String),

    /// API answered with a non-success status.
    #[error("target health API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a valid describe-target-health payload.
    #[error("malformed target health response: {0}")]
    Decode(String),
}

pub type TargetHealthResult<T> = Result<T, TargetHealthError>;

/// A registered target: instance id or IP address, plus port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescription {
    pub id: String,
    pub port: u16,
}

impl TargetDescription {
    pub fn new(id: impl Into<String>, port: u16) -> Self {
        Self { id: id.into(), port }
    }
}

/// Health of one target as reported by the load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthDescription {
    #[serde(default)]
    pub target: Option<TargetDescription>,
    pub target_health: TargetHealth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetHealth {
    /// `healthy`, `unhealthy`, `initial`, `draining`, `unused`, `unavailable`.
    pub state: String,
    pub reason: Option<String>,
    pub description: Option<String>,
}

impl TargetHealthDescription {
    /// Convenience constructor for a bare state.
    pub fn with_state(state: impl Into<String>) -> Self {
        Self {
            target: None,
            target_health: TargetHealth {
                state: state.into(),
                ..Default::default()
            },
        }
    }
}

/// The live DescribeTargetHealth call.
#[async_trait]
pub trait TargetHealthClient: Send + Sync {
    /// Describe one target's health in a target group.
    ///
    /// Returns zero or one descriptions in practice. Zero means the target
    /// is not registered with the group.
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
        target: &TargetDescription,
    ) -> TargetHealthResult<Vec<TargetHealthDescription>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTargetHealthRequest<'a> {
    target_group_arn: &'a str,
    targets: [&'a TargetDescription; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeTargetHealthResponse {
    #[serde(default)]
    target_health_descriptions: Vec<TargetHealthDescription>,
}

/// Target health client speaking JSON over HTTP to a target-health gateway.
#[derive(Clone)]
pub struct HttpTargetHealthClient {
    client: reqwest::Client,
    config: SharedConfig,
}

impl HttpTargetHealthClient {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

impl std::fmt::Debug for HttpTargetHealthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let config = self.config.load();
        f.debug_struct("HttpTargetHealthClient")
            .field("endpoint", &config.target_health.endpoint)
            .field("timeout_secs", &config.target_health.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl TargetHealthClient for HttpTargetHealthClient {
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
        target: &TargetDescription,
    ) -> TargetHealthResult<Vec<TargetHealthDescription>> {
        let (endpoint, timeout_secs) = {
            let config = self.config.load();
            (
                config.target_health.endpoint.clone(),
                config.target_health.timeout_secs,
            )
        };
        let url: url::Url = endpoint.parse().map_err(|e: url::ParseError| {
            TargetHealthError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        let body = DescribeTargetHealthRequest {
            target_group_arn,
            targets: [target],
        };

        tracing::debug!(
            target_group = %target_group_arn,
            target_id = %target.id,
            port = target.port,
            "Describing target health"
        );

        let call = async {
            let response = self
                .client
                .post(url)
                .json(&body)
                .send()
                .await
                .map_err(|e| TargetHealthError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TargetHealthError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TargetHealthError::Transport(e.to_string()))?;
            serde_json::from_slice::<DescribeTargetHealthResponse>(&bytes)
                .map_err(|e| TargetHealthError::Decode(e.to_string()))
        };

        let result = match timeout(Duration::from_secs(timeout_secs), call).await {
            Ok(result) => result,
            Err(_) => Err(TargetHealthError::Timeout(timeout_secs)),
        };

        match result {
            Ok(response) => Ok(response.target_health_descriptions),
            Err(e) => {
                metrics::record_query_failure();
                Err(e)
            }
        }
    }
}
