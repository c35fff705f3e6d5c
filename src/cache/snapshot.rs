//! Snapshot of previously cached ECS entities.
//!
//! # Responsibilities
//! - Keyed, read-only lookups for one resolution pass
//! - Load and save the snapshot as JSON
//! - Apply a pass result (fresh HEALTH records, evictions)

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::cache::data::{Attributes, CacheResult};
use crate::cache::keys::{Keys, Namespace};
use crate::ecs::{ContainerInstance, Service, Task, TaskDefinition};

/// Errors from loading or saving a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Read-only view of the prior cache snapshot.
///
/// Missing entries are `None`, never errors.
pub trait SnapshotProvider: Send + Sync {
    /// All cached tasks for an account and region.
    fn tasks(&self, account: &str, region: &str) -> Vec<Task>;

    fn container_instance(&self, key: &str) -> Option<ContainerInstance>;

    fn service(&self, key: &str) -> Option<Service>;

    fn task_definition(&self, key: &str) -> Option<TaskDefinition>;
}

/// On-disk layout: one key → entity map per namespace.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SnapshotFile {
    tasks: BTreeMap<String, Task>,
    services: BTreeMap<String, Service>,
    task_definitions: BTreeMap<String, TaskDefinition>,
    container_instances: BTreeMap<String, ContainerInstance>,
    health: BTreeMap<String, Attributes>,
}

/// Summary of applying one pass to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub written: usize,
    pub evicted: usize,
    /// Previous HEALTH records in scope that this pass no longer reports.
    pub superseded: usize,
}

/// Concurrent in-memory cache store.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    tasks: Arc<DashMap<String, Task>>,
    services: Arc<DashMap<String, Service>>,
    task_definitions: Arc<DashMap<String, TaskDefinition>>,
    container_instances: Arc<DashMap<String, ContainerInstance>>,
    health: Arc<DashMap<String, Attributes>>,
    persistence_path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Default::default()
        }
    }

    /// Load from file if it exists, otherwise start empty.
    pub fn load_from_file(path: &Path) -> SnapshotResult<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let file: SnapshotFile = serde_json::from_reader(reader)?;

            for (k, v) in file.tasks {
                store.tasks.insert(k, v);
            }
            for (k, v) in file.services {
                store.services.insert(k, v);
            }
            for (k, v) in file.task_definitions {
                store.task_definitions.insert(k, v);
            }
            for (k, v) in file.container_instances {
                store.container_instances.insert(k, v);
            }
            for (k, v) in file.health {
                store.health.insert(k, v);
            }

            tracing::info!(
                path = %path.display(),
                tasks = store.tasks.len(),
                services = store.services.len(),
                task_definitions = store.task_definitions.len(),
                container_instances = store.container_instances.len(),
                "Loaded cache snapshot"
            );
        } else {
            tracing::warn!(path = %path.display(), "Snapshot file not found, starting empty");
        }
        Ok(store)
    }

    /// Save to the persistence path, if one is configured.
    pub fn save_to_file(&self) -> SnapshotResult<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let file = SnapshotFile {
            tasks: collect(&self.tasks),
            services: collect(&self.services),
            task_definitions: collect(&self.task_definitions),
            container_instances: collect(&self.container_instances),
            health: collect(&self.health),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &file)?;
        tracing::info!(path = %path.display(), health = file.health.len(), "Saved cache snapshot");
        Ok(())
    }

    pub fn put_task(&self, key: String, task: Task) {
        self.tasks.insert(key, task);
    }

    pub fn put_service(&self, key: String, service: Service) {
        self.services.insert(key, service);
    }

    pub fn put_task_definition(&self, key: String, task_definition: TaskDefinition) {
        self.task_definitions.insert(key, task_definition);
    }

    pub fn put_container_instance(&self, key: String, instance: ContainerInstance) {
        self.container_instances.insert(key, instance);
    }

    /// Cached HEALTH attributes by key.
    pub fn health(&self, key: &str) -> Option<Attributes> {
        self.health.get(key).map(|r| r.value().clone())
    }

    /// Whether any namespace holds the key.
    pub fn contains(&self, key: &str) -> bool {
        match Keys::namespace_of(key) {
            Some(Namespace::Tasks) => self.tasks.contains_key(key),
            Some(Namespace::Services) => self.services.contains_key(key),
            Some(Namespace::TaskDefinitions) => self.task_definitions.contains_key(key),
            Some(Namespace::ContainerInstances) => self.container_instances.contains_key(key),
            Some(Namespace::Health) => self.health.contains_key(key),
            None => false,
        }
    }

    /// Apply a pass result: replace HEALTH for the agent's account and region,
    /// then drop evicted keys.
    ///
    /// HEALTH is authoritative: any `health` key under `keys`' account and
    /// region that the pass did not produce is removed. Other scopes are left
    /// alone.
    ///
    /// Each evicted key is removed from the map named by its own namespace
    /// segment, not the eviction bucket it was listed under. Service evictions
    /// built in the task-definition namespace therefore drop task-definition
    /// entries.
    pub fn apply(&self, keys: &Keys, result: &CacheResult) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let fresh = result.records(Namespace::Health);

        let scope = keys.build(Namespace::Health, "");
        let fresh_ids: HashSet<&str> = fresh.iter().map(|record| record.id.as_str()).collect();
        let stale: Vec<String> = self
            .health
            .iter()
            .filter(|r| r.key().starts_with(&scope) && !fresh_ids.contains(r.key().as_str()))
            .map(|r| r.key().clone())
            .collect();
        for key in stale {
            if self.health.remove(&key).is_some() {
                tracing::debug!(key = %key, "Dropping health record not reported by this pass");
                summary.superseded += 1;
            }
        }

        for record in fresh {
            self.health.insert(record.id.clone(), record.attributes.clone());
            summary.written += 1;
        }

        for (namespace, keys) in &result.evictions {
            for key in keys {
                let removed = match Keys::namespace_of(key) {
                    Some(Namespace::Tasks) => self.tasks.remove(key).is_some(),
                    Some(Namespace::Services) => self.services.remove(key).is_some(),
                    Some(Namespace::TaskDefinitions) => {
                        self.task_definitions.remove(key).is_some()
                    }
                    Some(Namespace::ContainerInstances) => {
                        self.container_instances.remove(key).is_some()
                    }
                    Some(Namespace::Health) => self.health.remove(key).is_some(),
                    None => false,
                };
                if removed {
                    summary.evicted += 1;
                } else {
                    tracing::debug!(namespace = %namespace, key = %key, "Evicted key was not cached");
                }
            }
        }

        summary
    }
}

impl SnapshotProvider for SnapshotStore {
    fn tasks(&self, account: &str, region: &str) -> Vec<Task> {
        let prefix = Keys::new(account, region).build(Namespace::Tasks, "");
        let mut tasks: Vec<(String, Task)> = self
            .tasks
            .iter()
            .filter(|r| r.key().starts_with(&prefix))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        // DashMap iteration order is arbitrary; keep passes deterministic.
        tasks.sort_by(|a, b| a.0.cmp(&b.0));
        tasks.into_iter().map(|(_, task)| task).collect()
    }

    fn container_instance(&self, key: &str) -> Option<ContainerInstance> {
        self.container_instances.get(key).map(|r| r.value().clone())
    }

    fn service(&self, key: &str) -> Option<Service> {
        self.services.get(key).map(|r| r.value().clone())
    }

    fn task_definition(&self, key: &str) -> Option<TaskDefinition> {
        self.task_definitions.get(key).map(|r| r.value().clone())
    }
}

fn collect<V: Clone>(map: &DashMap<String, V>) -> BTreeMap<String, V> {
    map.iter()
        .map(|r| (r.key().clone(), r.value().clone()))
        .collect()
}
