//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ecs_task_health::cache::{Keys, SnapshotStore};
use ecs_task_health::ecs::{
    Container, ContainerDefinition, ContainerInstance, LoadBalancer, NetworkBinding,
    NetworkInterface, PortMapping, Service, Task, TaskDefinition,
};
use ecs_task_health::health::target::TargetHealthResult;
use ecs_task_health::health::{
    TargetDescription, TargetHealthClient, TargetHealthDescription, TargetHealthError,
};

pub const ACCOUNT: &str = "test-account";
pub const REGION: &str = "us-west-2";

pub fn keys() -> Keys {
    Keys::new(ACCOUNT, REGION)
}

pub fn task_arn(id: &str) -> String {
    format!("arn:aws:ecs:{REGION}:123456789012:task/default/{id}")
}

pub fn task_definition_arn(family: &str) -> String {
    format!("arn:aws:ecs:{REGION}:123456789012:task-definition/{family}:1")
}

/// awsvpc task with one container and one ENI.
pub fn interface_task(id: &str, service: &str, address: &str) -> Task {
    Task {
        task_arn: task_arn(id),
        task_id: Some(id.to_string()),
        group: format!("service:{service}"),
        container_instance_arn: None,
        containers: vec![Container {
            network_interfaces: vec![NetworkInterface {
                private_ipv4_address: Some(address.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
}

/// Bridge task with one container bound to `host_port`.
pub fn bridge_task(id: &str, service: &str, host_port: u16, instance_arn: &str) -> Task {
    Task {
        task_arn: task_arn(id),
        task_id: Some(id.to_string()),
        group: format!("service:{service}"),
        container_instance_arn: Some(instance_arn.to_string()),
        containers: vec![Container {
            network_bindings: vec![NetworkBinding {
                host_port: Some(host_port),
                container_port: Some(80),
            }],
            ..Default::default()
        }],
    }
}

pub fn load_balancer(target_group: Option<&str>, container_port: u16) -> LoadBalancer {
    LoadBalancer {
        target_group_arn: target_group.map(str::to_string),
        container_name: Some("app".into()),
        container_port: Some(container_port),
    }
}

pub fn service(name: &str, family: &str, load_balancers: Vec<LoadBalancer>) -> Service {
    Service {
        service_name: name.to_string(),
        load_balancers,
        task_definition: task_definition_arn(family),
    }
}

pub fn task_definition(family: &str, container_ports: &[u16]) -> TaskDefinition {
    TaskDefinition {
        task_definition_arn: task_definition_arn(family),
        container_definitions: vec![ContainerDefinition {
            name: Some("app".into()),
            port_mappings: container_ports
                .iter()
                .map(|port| PortMapping {
                    container_port: Some(*port),
                    host_port: None,
                })
                .collect(),
        }],
    }
}

pub fn container_instance(arn: &str, ec2_instance_id: Option<&str>) -> ContainerInstance {
    ContainerInstance {
        container_instance_arn: arn.to_string(),
        ec2_instance_id: ec2_instance_id.map(str::to_string),
    }
}

/// Builder over an in-memory snapshot store.
#[derive(Default)]
pub struct Snapshot {
    pub store: SnapshotStore,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(self, task: Task) -> Self {
        self.store.put_task(keys().task(task.id()), task);
        self
    }

    pub fn service(self, service: Service) -> Self {
        self.store
            .put_service(keys().service(&service.service_name), service);
        self
    }

    pub fn task_definition(self, definition: TaskDefinition) -> Self {
        self.store.put_task_definition(
            keys().task_definition(&definition.task_definition_arn),
            definition,
        );
        self
    }

    pub fn container_instance(self, instance: ContainerInstance) -> Self {
        self.store.put_container_instance(
            keys().container_instance(&instance.container_instance_arn),
            instance,
        );
        self
    }
}

/// Canned answer for one (target group, target id, port).
#[derive(Debug, Clone)]
pub enum Reply {
    States(Vec<&'static str>),
    Fail,
}

/// Target health client answering from a script and recording calls.
///
/// Unscripted targets answer with no descriptions.
#[derive(Default)]
pub struct ScriptedTargetHealth {
    replies: Mutex<HashMap<(String, String, u16), Reply>>,
    calls: Mutex<Vec<(String, TargetDescription)>>,
}

impl ScriptedTargetHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, target_group: &str, id: &str, port: u16, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert((target_group.to_string(), id.to_string(), port), reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, TargetDescription)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetHealthClient for ScriptedTargetHealth {
    async fn describe_target_health(
        &self,
        target_group_arn: &str,
        target: &TargetDescription,
    ) -> TargetHealthResult<Vec<TargetHealthDescription>> {
        self.calls
            .lock()
            .unwrap()
            .push((target_group_arn.to_string(), target.clone()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(target_group_arn.to_string(), target.id.clone(), target.port))
            .cloned();

        match reply {
            None => Ok(Vec::new()),
            Some(Reply::States(states)) => Ok(states
                .into_iter()
                .map(TargetHealthDescription::with_state)
                .collect()),
            Some(Reply::Fail) => Err(TargetHealthError::Transport("connection refused".into())),
        }
    }
}

/// Start a programmable JSON gateway on an ephemeral port.
///
/// The handler receives the request body and returns (status, body).
pub async fn start_programmable_gateway<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request_body = read_request_body(&mut socket).await;
                        let (status, body) = f(request_body).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            403 => "403 Forbidden",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body_start = header_end + 4;
            if buffer.len() >= body_start + content_length {
                return String::from_utf8_lossy(&buffer[body_start..body_start + content_length])
                    .into_owned();
            }
        }
    }

    String::new()
}
