//! Task health caching agent.
//!
//! # Responsibilities
//! - Declare identity and the data types this agent provides
//! - Run one resolution pass against the snapshot and live API
//! - Turn the pass into cache results plus merged evictions

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::data::{AgentDataType, CacheResult, Evictions};
use crate::cache::keys::{Keys, Namespace};
use crate::cache::snapshot::SnapshotProvider;
use crate::health::eviction::EvictionReason;
use crate::health::record::{fresh_data, merge_evictions};
use crate::health::resolver::TaskHealthResolver;
use crate::health::target::{TargetHealthClient, TargetHealthError};
use crate::observability::metrics;

/// Health provider identifier consumed by health aggregation.
pub const HEALTH_ID: &str = "ecs-task-instance-health";

const AGENT_NAME: &str = "TaskHealthCachingAgent";

/// Errors that fail a whole pass.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("target health query failed: {0}")]
    TargetHealth(#[from] TargetHealthError),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Produces authoritative HEALTH data for ECS tasks behind load balancers.
#[derive(Clone)]
pub struct TaskHealthCachingAgent {
    keys: Keys,
    snapshot: Arc<dyn SnapshotProvider>,
    client: Arc<dyn TargetHealthClient>,
    max_concurrent_tasks: usize,
}

impl TaskHealthCachingAgent {
    pub fn new(
        account: impl Into<String>,
        region: impl Into<String>,
        snapshot: Arc<dyn SnapshotProvider>,
        client: Arc<dyn TargetHealthClient>,
    ) -> Self {
        Self {
            keys: Keys::new(account, region),
            snapshot,
            client,
            max_concurrent_tasks: 1,
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrent_tasks = limit.max(1);
        self
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    /// Stable identity used by the scheduler for logging and dedup.
    pub fn agent_type(&self) -> String {
        format!("{}/{}/{}", self.keys.account(), self.keys.region(), AGENT_NAME)
    }

    pub fn health_id(&self) -> &'static str {
        HEALTH_ID
    }

    /// This agent is the sole authority for HEALTH records.
    pub fn provided_data_types(&self) -> Vec<AgentDataType> {
        vec![AgentDataType::authoritative(Namespace::Health)]
    }

    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    /// Run one pass, merging this pass's evictions into `evictions`.
    ///
    /// On error nothing is returned: partial records and evictions from the
    /// failed pass are discarded.
    pub async fn load_data(&self, evictions: Evictions) -> AgentResult<CacheResult> {
        let pass_id = Uuid::new_v4();
        let span = tracing::info_span!("task_health_pass", agent = %self.agent_type(), %pass_id);
        self.run_pass(evictions).instrument(span).await
    }

    async fn run_pass(&self, evictions: Evictions) -> AgentResult<CacheResult> {
        let started = Instant::now();
        let resolver = TaskHealthResolver::new(self.snapshot.as_ref(), self.client.as_ref(), &self.keys)
            .with_concurrency(self.max_concurrent_tasks);

        let resolution = match resolver.resolve().await {
            Ok(resolution) => resolution,
            Err(e) => {
                metrics::record_pass("failed", started.elapsed());
                tracing::error!(error = %e, "Task health pass failed, discarding results");
                return Err(e.into());
            }
        };

        let result = CacheResult {
            cache_results: fresh_data(&self.keys, &resolution.health),
            evictions: merge_evictions(evictions, &resolution.evictions),
        };

        metrics::record_pass("succeeded", started.elapsed());
        metrics::record_health_records(resolution.health.len());
        for reason in [EvictionReason::ServiceNotFound, EvictionReason::TargetNotRegistered] {
            metrics::record_evictions(reason.as_str(), resolution.evictions.count(reason));
        }

        tracing::info!(
            health = resolution.health.len(),
            evicted_tasks = resolution.evictions.tasks.len(),
            evicted_services = resolution.evictions.services.len(),
            evicted_task_definitions = resolution.evictions.task_definitions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Caching task health checks"
        );

        Ok(result)
    }
}

impl std::fmt::Debug for TaskHealthCachingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHealthCachingAgent")
            .field("agent_type", &self.agent_type())
            .field("max_concurrent_tasks", &self.max_concurrent_tasks)
            .finish()
    }
}
