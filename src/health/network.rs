//! Networking mode classification and query target construction.
//!
//! # Responsibilities
//! - Classify a task as bridge, interface (awsvpc) or unresolvable
//! - Match a load balancer's container port against the task's ports
//! - Build the (target id, port) pair to ask the load balancer about
//!
//! # Design Decisions
//! - Only the primary container decides the mode (see `Task::primary_container`)
//! - Bindings win over interfaces when both are present
//! - A port mismatch means "this load balancer does not front this task"

use crate::ecs::{Container, ContainerDefinition, ContainerInstance, LoadBalancer, Task, TaskDefinition};
use crate::health::target::TargetDescription;

/// How a task's containers are reachable from the load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    /// Container ports mapped to dynamic host ports on the EC2 instance.
    Bridge,
    /// Task owns its own ENI; container port used directly.
    Interface,
    /// No networking information yet (task still starting, or none at all).
    Unresolvable,
}

impl NetworkMode {
    /// Classify a task by its primary container.
    pub fn classify(task: &Task) -> Self {
        match task.primary_container() {
            None => NetworkMode::Unresolvable,
            Some(container) if !container.network_bindings.is_empty() => NetworkMode::Bridge,
            Some(container) if !container.network_interfaces.is_empty() => NetworkMode::Interface,
            Some(_) => NetworkMode::Unresolvable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::Bridge => "bridge",
            NetworkMode::Interface => "interface",
            NetworkMode::Unresolvable => "unresolvable",
        }
    }
}

/// Find a container definition port mapping exposing `container_port`.
pub fn match_container_port(
    definitions: &[ContainerDefinition],
    container_port: u16,
) -> Option<u16> {
    definitions
        .iter()
        .flat_map(|definition| definition.port_mappings.iter())
        .filter_map(|mapping| mapping.container_port)
        .find(|port| *port == container_port)
}

/// Find a network binding on any container whose host port is `host_port`.
pub fn match_host_port(containers: &[Container], host_port: u16) -> Option<u16> {
    containers
        .iter()
        .flat_map(|container| container.network_bindings.iter())
        .filter_map(|binding| binding.host_port)
        .find(|port| *port == host_port)
}

/// Strategy turning a load balancer attachment into a query target.
///
/// `None` means the load balancer does not apply to this task; the pair is
/// skipped without eviction.
pub trait ResolveTarget: Send + Sync {
    fn resolve_target(&self, load_balancer: &LoadBalancer) -> Option<TargetDescription>;
}

/// Bridge mode: query the EC2 instance at the matched host port.
#[derive(Debug)]
pub struct BridgeTarget<'a> {
    task: &'a Task,
    instance: Option<&'a ContainerInstance>,
}

impl<'a> BridgeTarget<'a> {
    pub fn new(task: &'a Task, instance: Option<&'a ContainerInstance>) -> Self {
        Self { task, instance }
    }
}

impl ResolveTarget for BridgeTarget<'_> {
    fn resolve_target(&self, load_balancer: &LoadBalancer) -> Option<TargetDescription> {
        let Some(ec2_instance_id) = self.instance.and_then(|i| i.ec2_instance_id.as_deref()) else {
            tracing::debug!(
                task = %self.task.task_arn,
                "Container instance is missing or has no EC2 instance id"
            );
            return None;
        };

        let Some(port) = load_balancer
            .container_port
            .and_then(|port| match_host_port(&self.task.containers, port))
        else {
            tracing::debug!(
                task = %self.task.task_arn,
                container_port = ?load_balancer.container_port,
                "No network binding with the load balanced host port"
            );
            return None;
        };

        Some(TargetDescription::new(ec2_instance_id, port))
    }
}

/// Interface mode: query the task's private address at the matched container port.
#[derive(Debug)]
pub struct InterfaceTarget<'a> {
    task: &'a Task,
    task_definition: &'a TaskDefinition,
}

impl<'a> InterfaceTarget<'a> {
    pub fn new(task: &'a Task, task_definition: &'a TaskDefinition) -> Self {
        Self {
            task,
            task_definition,
        }
    }

    fn private_address(&self) -> Option<&'a str> {
        self.task
            .primary_container()?
            .network_interfaces
            .first()?
            .private_ipv4_address
            .as_deref()
    }
}

impl ResolveTarget for InterfaceTarget<'_> {
    fn resolve_target(&self, load_balancer: &LoadBalancer) -> Option<TargetDescription> {
        let Some(port) = load_balancer.container_port.and_then(|port| {
            match_container_port(&self.task_definition.container_definitions, port)
        }) else {
            tracing::debug!(
                task = %self.task.task_arn,
                container_port = ?load_balancer.container_port,
                "No port mapping with the load balanced container port"
            );
            return None;
        };

        let Some(address) = self.private_address() else {
            tracing::debug!(task = %self.task.task_arn, "Network interface has no private address");
            return None;
        };

        Some(TargetDescription::new(address, port))
    }
}
