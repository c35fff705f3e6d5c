//! Per-pass task health resolution.
//!
//! # Responsibilities
//! - Walk every cached task for the account/region
//! - Resolve owning service, task definition and container instance
//! - Pick the networking strategy and query each applicable target group
//! - Produce health records and eviction keys for the pass
//!
//! # Design Decisions
//! - Each task resolves into its own `TaskOutcome`; outcomes are merged in
//!   snapshot order once every task has finished
//! - Tasks may resolve concurrently (bounded), queries within a task run
//!   in load balancer order
//! - The first live query failure fails the pass

use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::cache::keys::Keys;
use crate::cache::snapshot::SnapshotProvider;
use crate::ecs::Task;
use crate::health::eviction::EvictionSet;
use crate::health::network::{BridgeTarget, InterfaceTarget, NetworkMode, ResolveTarget};
use crate::health::record::TaskHealth;
use crate::health::target::{TargetHealthClient, TargetHealthResult};

/// Output of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub health: Vec<TaskHealth>,
    pub evictions: EvictionSet,
}

/// Output of resolving a single task.
#[derive(Debug, Default)]
struct TaskOutcome {
    health: Vec<TaskHealth>,
    evictions: EvictionSet,
}

/// Resolves task health for one account and region.
pub struct TaskHealthResolver<'a> {
    snapshot: &'a dyn SnapshotProvider,
    client: &'a dyn TargetHealthClient,
    keys: &'a Keys,
    max_concurrent_tasks: usize,
}

impl<'a> TaskHealthResolver<'a> {
    pub fn new(
        snapshot: &'a dyn SnapshotProvider,
        client: &'a dyn TargetHealthClient,
        keys: &'a Keys,
    ) -> Self {
        Self {
            snapshot,
            client,
            keys,
            max_concurrent_tasks: 1,
        }
    }

    /// Resolve up to `limit` tasks at once. Zero is treated as one.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrent_tasks = limit.max(1);
        self
    }

    /// Run one pass over all cached tasks.
    pub async fn resolve(&self) -> TargetHealthResult<Resolution> {
        let tasks = self.snapshot.tasks(self.keys.account(), self.keys.region());
        tracing::debug!(tasks = tasks.len(), "Resolving task health");

        let pending: Vec<_> = tasks.iter().map(|task| self.resolve_task(task)).collect();
        let outcomes: Vec<TaskOutcome> = stream::iter(pending)
            .buffered(self.max_concurrent_tasks)
            .try_collect()
            .await?;

        let mut resolution = Resolution::default();
        for outcome in outcomes {
            resolution.health.extend(outcome.health);
            resolution.evictions.merge(outcome.evictions);
        }
        Ok(resolution)
    }

    async fn resolve_task(&self, task: &Task) -> TargetHealthResult<TaskOutcome> {
        let mut outcome = TaskOutcome::default();

        let container_instance = task
            .container_instance_arn
            .as_deref()
            .and_then(|arn| self.snapshot.container_instance(&self.keys.container_instance(arn)));

        let service_name = task.service_name();
        let Some(service) = self.snapshot.service(&self.keys.service(service_name)) else {
            tracing::debug!(task = %task.task_arn, service = %service_name, "Owning service not cached, evicting task");
            outcome.evictions.record_service_not_found(self.keys, task);
            return Ok(outcome);
        };

        let task_definition = self
            .snapshot
            .task_definition(&self.keys.task_definition(&service.task_definition));

        let mode = NetworkMode::classify(task);
        if mode == NetworkMode::Unresolvable {
            tracing::debug!(task = %task.task_arn, "Task has no networking information yet");
            return Ok(outcome);
        }

        let Some(task_definition) = task_definition else {
            tracing::debug!(
                task = %task.task_arn,
                task_definition = %service.task_definition,
                "Task definition not cached yet"
            );
            return Ok(outcome);
        };

        let strategy: Box<dyn ResolveTarget + '_> = match mode {
            NetworkMode::Bridge => Box::new(BridgeTarget::new(task, container_instance.as_ref())),
            NetworkMode::Interface => Box::new(InterfaceTarget::new(task, &task_definition)),
            NetworkMode::Unresolvable => return Ok(outcome),
        };

        tracing::debug!(
            task = %task.task_arn,
            mode = mode.as_str(),
            load_balancers = service.load_balancers.len(),
            "Resolving load balancer targets"
        );

        for load_balancer in &service.load_balancers {
            let Some(target_group_arn) = load_balancer.target_group_arn.as_deref() else {
                tracing::debug!(task = %task.task_arn, "Load balancer has no target group");
                continue;
            };

            let Some(target) = strategy.resolve_target(load_balancer) else {
                continue;
            };

            let descriptions = self
                .client
                .describe_target_health(target_group_arn, &target)
                .await?;

            let Some(description) = descriptions.first() else {
                tracing::debug!(
                    task = %task.task_arn,
                    target_group = %target_group_arn,
                    target_id = %target.id,
                    port = target.port,
                    "Target not registered, evicting stale entries"
                );
                outcome
                    .evictions
                    .record_target_not_registered(self.keys, task, &service);
                continue;
            };

            let health = TaskHealth::from_description(task, service_name, description);
            tracing::debug!(
                task = %task.task_arn,
                target_group = %target_group_arn,
                target_state = %description.target_health.state,
                state = %health.state,
                "Resolved task health"
            );
            outcome.health.push(health);
        }

        Ok(outcome)
    }
}
