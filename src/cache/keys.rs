//! Cache key construction.
//!
//! Keys have the shape `ecs;<namespace>;<account>;<region>;<identifier>`.

use serde::{Deserialize, Serialize};
use std::fmt;

const PROVIDER: &str = "ecs";
const SEPARATOR: char = ';';

/// Cache namespaces touched by the task health agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    Tasks,
    Services,
    TaskDefinitions,
    ContainerInstances,
    Health,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Tasks => "tasks",
            Namespace::Services => "services",
            Namespace::TaskDefinitions => "taskDefinitions",
            Namespace::ContainerInstances => "containerInstances",
            Namespace::Health => "health",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key builder bound to one account and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    account: String,
    region: String,
}

impl Keys {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build a key in any namespace.
    pub fn build(&self, namespace: Namespace, identifier: &str) -> String {
        format!(
            "{PROVIDER}{SEPARATOR}{namespace}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{identifier}",
            self.account, self.region
        )
    }

    pub fn task(&self, task_id: &str) -> String {
        self.build(Namespace::Tasks, task_id)
    }

    pub fn service(&self, service_name: &str) -> String {
        self.build(Namespace::Services, service_name)
    }

    pub fn task_definition(&self, task_definition_arn: &str) -> String {
        self.build(Namespace::TaskDefinitions, task_definition_arn)
    }

    pub fn container_instance(&self, container_instance_arn: &str) -> String {
        self.build(Namespace::ContainerInstances, container_instance_arn)
    }

    pub fn task_health(&self, task_id: &str) -> String {
        self.build(Namespace::Health, task_id)
    }

    /// Namespace of a key built by this module, if recognizable.
    pub fn namespace_of(key: &str) -> Option<Namespace> {
        let mut parts = key.split(SEPARATOR);
        if parts.next() != Some(PROVIDER) {
            return None;
        }
        match parts.next()? {
            "tasks" => Some(Namespace::Tasks),
            "services" => Some(Namespace::Services),
            "taskDefinitions" => Some(Namespace::TaskDefinitions),
            "containerInstances" => Some(Namespace::ContainerInstances),
            "health" => Some(Namespace::Health),
            _ => None,
        }
    }
}
