//! Cached ECS entities as read from the prior snapshot.

use serde::{Deserialize, Serialize};

/// Prefix ECS puts in front of the service name in a task's `group`.
pub const SERVICE_GROUP_PREFIX: &str = "service:";

/// One running instance of a containerized workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Full task ARN.
    pub task_arn: String,

    /// Short task identifier. Derived from the ARN when not cached.
    pub task_id: Option<String>,

    /// Owning group, `service:<name>` for service-launched tasks.
    pub group: String,

    /// Container instance the task is placed on (EC2 launch type only).
    pub container_instance_arn: Option<String>,

    /// Containers in task-definition order.
    pub containers: Vec<Container>,
}

impl Task {
    /// Short identifier used in cache keys.
    pub fn id(&self) -> &str {
        match &self.task_id {
            Some(id) if !id.is_empty() => id,
            _ => self.task_arn.rsplit('/').next().unwrap_or_default(),
        }
    }

    /// Name of the owning service: everything after the first `service:`.
    ///
    /// Tasks not launched by a service yield an empty name.
    pub fn service_name(&self) -> &str {
        self.group
            .find(SERVICE_GROUP_PREFIX)
            .map(|idx| &self.group[idx + SERVICE_GROUP_PREFIX.len()..])
            .unwrap_or("")
    }

    /// The container considered for networking decisions.
    ///
    /// Only the first container is inspected, even for multi-container tasks.
    /// Sidecars with their own port mappings are not classified separately.
    pub fn primary_container(&self) -> Option<&Container> {
        self.containers.first()
    }
}

/// A container within a running task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub name: Option<String>,

    /// Host/container port pairs (bridge networking).
    pub network_bindings: Vec<NetworkBinding>,

    /// Task-level network interfaces (awsvpc networking).
    pub network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkBinding {
    pub host_port: Option<u16>,
    pub container_port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    pub attachment_id: Option<String>,
    pub private_ipv4_address: Option<String>,
}

/// A named, scaled group of tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub service_name: String,

    /// Load balancers fronting the service's tasks.
    pub load_balancers: Vec<LoadBalancer>,

    /// Task definition ARN the service currently runs.
    pub task_definition: String,
}

/// Load balancer attachment as declared on a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancer {
    pub target_group_arn: Option<String>,
    pub container_name: Option<String>,
    pub container_port: Option<u16>,
}

/// Template describing a task's containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskDefinition {
    pub task_definition_arn: String,
    pub container_definitions: Vec<ContainerDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerDefinition {
    pub name: Option<String>,
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortMapping {
    pub container_port: Option<u16>,
    pub host_port: Option<u16>,
}

/// EC2 host registered with the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerInstance {
    pub container_instance_arn: String,
    pub ec2_instance_id: Option<String>,
}
