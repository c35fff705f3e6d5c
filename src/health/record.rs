//! Task health records and their cache representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::cache::data::{Attributes, CacheData, Evictions};
use crate::cache::keys::{Keys, Namespace};
use crate::ecs::Task;
use crate::health::eviction::EvictionSet;
use crate::health::target::TargetHealthDescription;

/// Health type reported for every record produced here.
pub const LOAD_BALANCER_HEALTH_TYPE: &str = "loadBalancer";

/// Load balancer target state as seen by health consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Up,
    Unknown,
}

impl HealthState {
    /// `healthy` is `Up`; every other state is `Unknown`.
    pub fn from_target_state(state: &str) -> Self {
        if state == "healthy" {
            HealthState::Up
        } else {
            HealthState::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Up => "Up",
            HealthState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived health of one task behind one load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHealth {
    /// The task ARN; health aggregation keys instances by it.
    pub instance_id: String,
    pub state: HealthState,
    #[serde(rename = "type")]
    pub health_type: String,
    pub service_name: String,
    pub task_arn: String,
    pub task_id: String,
}

impl TaskHealth {
    /// Build from the first live description for a task.
    pub fn from_description(
        task: &Task,
        service_name: &str,
        description: &TargetHealthDescription,
    ) -> Self {
        Self {
            instance_id: task.task_arn.clone(),
            state: HealthState::from_target_state(&description.target_health.state),
            health_type: LOAD_BALANCER_HEALTH_TYPE.to_string(),
            service_name: service_name.to_string(),
            task_arn: task.task_arn.clone(),
            task_id: task.id().to_string(),
        }
    }

    /// Flat attribute map for the cache store.
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("instanceId".into(), Value::from(self.instance_id.as_str()));
        attributes.insert("state".into(), Value::from(self.state.as_str()));
        attributes.insert("type".into(), Value::from(self.health_type.as_str()));
        attributes.insert("service".into(), Value::from(self.service_name.as_str()));
        attributes.insert("taskArn".into(), Value::from(self.task_arn.as_str()));
        attributes.insert("taskId".into(), Value::from(self.task_id.as_str()));
        attributes
    }
}

/// Fresh HEALTH data for a pass, keyed by task health key.
///
/// Records share the task's key when it sits behind several load balancers.
/// They are kept in load balancer order and the store keeps the last one.
pub fn fresh_data(keys: &Keys, health: &[TaskHealth]) -> BTreeMap<String, Vec<CacheData>> {
    let records = health
        .iter()
        .map(|h| CacheData::new(keys.task_health(&h.task_id), h.to_attributes()))
        .collect();

    let mut data = BTreeMap::new();
    data.insert(Namespace::Health.to_string(), records);
    data
}

/// Merge a pass's evictions into the caller's eviction map.
///
/// Existing keys are preserved; empty lists add no namespace entry.
pub fn merge_evictions(mut evictions: Evictions, set: &EvictionSet) -> Evictions {
    for (namespace, keys) in [
        (Namespace::Tasks, &set.tasks),
        (Namespace::Services, &set.services),
        (Namespace::TaskDefinitions, &set.task_definitions),
    ] {
        if keys.is_empty() {
            continue;
        }
        evictions
            .entry(namespace.to_string())
            .or_default()
            .extend(keys.iter().cloned());
    }
    evictions
}
