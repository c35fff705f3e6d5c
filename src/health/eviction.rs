//! Stale cache key collection.

use crate::cache::keys::Keys;
use crate::ecs::{Service, Task};

/// Why a set of keys was marked stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// The task's owning service is no longer cached.
    ServiceNotFound,
    /// A port matched but the target group does not know the target.
    TargetNotRegistered,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::ServiceNotFound => "service_not_found",
            EvictionReason::TargetNotRegistered => "target_not_registered",
        }
    }
}

/// Keys to evict, per namespace, for one task or one whole pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionSet {
    pub tasks: Vec<String>,
    pub services: Vec<String>,
    pub task_definitions: Vec<String>,
    /// One entry per recorded eviction event.
    pub reasons: Vec<EvictionReason>,
}

impl EvictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.services.is_empty() && self.task_definitions.is_empty()
    }

    /// The task points at a service that vanished: evict only the task.
    pub fn record_service_not_found(&mut self, keys: &Keys, task: &Task) {
        self.tasks.push(keys.task(task.id()));
        self.reasons.push(EvictionReason::ServiceNotFound);
    }

    /// The load balancer no longer knows the target: evict task, service and
    /// task definition.
    ///
    /// The service key is built in the task-definition namespace. Downstream
    /// consumers of this cache match on that format, so it must not change.
    pub fn record_target_not_registered(&mut self, keys: &Keys, task: &Task, service: &Service) {
        self.services.push(keys.task_definition(&service.service_name));
        self.tasks.push(keys.task(task.id()));
        self.task_definitions
            .push(keys.task_definition(&service.task_definition));
        self.reasons.push(EvictionReason::TargetNotRegistered);
    }

    /// Number of recorded events with the given reason.
    pub fn count(&self, reason: EvictionReason) -> usize {
        self.reasons.iter().filter(|r| **r == reason).count()
    }

    /// Append another set, keeping order.
    pub fn merge(&mut self, other: EvictionSet) {
        self.tasks.extend(other.tasks);
        self.services.extend(other.services);
        self.task_definitions.extend(other.task_definitions);
        self.reasons.extend(other.reasons);
    }
}
