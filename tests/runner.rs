//! Agent passes applied to the snapshot store.

use std::sync::Arc;
use std::time::Duration;

use ecs_task_health::agent::caching_agent::HEALTH_ID;
use ecs_task_health::cache::{AgentDataType, Evictions, Namespace, SnapshotStore};
use ecs_task_health::config::{self, AccountConfig, AgentConfig, SharedConfig, SnapshotConfig};
use ecs_task_health::{AgentRunner, Shutdown, TaskHealthCachingAgent};

mod common;
use common::*;

fn agent_config(snapshot_path: Option<&std::path::Path>) -> SharedConfig {
    config::shared(AgentConfig {
        account: AccountConfig {
            name: ACCOUNT.to_string(),
            region: REGION.to_string(),
        },
        snapshot: SnapshotConfig {
            path: snapshot_path
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            save_on_apply: snapshot_path.is_some(),
        },
        ..Default::default()
    })
}

fn agent(store: &SnapshotStore, client: ScriptedTargetHealth) -> TaskHealthCachingAgent {
    TaskHealthCachingAgent::new(ACCOUNT, REGION, Arc::new(store.clone()), Arc::new(client))
}

/// One healthy interface task and one task whose target is gone.
fn mixed_snapshot() -> Snapshot {
    Snapshot::new()
        .task(interface_task("t1", "web", "10.0.0.5"))
        .task(interface_task("t2", "web", "10.0.0.6"))
        .service(service("web", "web", vec![load_balancer(Some("tg-1"), 80)]))
        .task_definition(task_definition("web", &[80]))
}

fn mixed_client() -> ScriptedTargetHealth {
    ScriptedTargetHealth::new().reply("tg-1", "10.0.0.5", 80, Reply::States(vec!["healthy"]))
}

#[tokio::test]
async fn test_agent_identity() {
    let snapshot = Snapshot::new();
    let agent = agent(&snapshot.store, ScriptedTargetHealth::new());

    assert_eq!(agent.agent_type(), "test-account/us-west-2/TaskHealthCachingAgent");
    assert_eq!(agent.health_id(), HEALTH_ID);
    assert_eq!(
        agent.provided_data_types(),
        vec![AgentDataType::authoritative(Namespace::Health)]
    );
}

#[tokio::test]
async fn test_load_data_merges_caller_evictions() {
    let snapshot = mixed_snapshot();
    let agent = agent(&snapshot.store, mixed_client());

    let mut existing = Evictions::new();
    existing.insert("tasks".into(), vec!["ecs;tasks;other;us-east-1;x".into()]);

    let result = agent.load_data(existing).await.unwrap();
    let keys = keys();

    let health = result.records(Namespace::Health);
    assert_eq!(health.len(), 1);
    assert_eq!(health[0].id, keys.task_health("t1"));
    assert_eq!(health[0].attributes["state"], "Up");
    assert_eq!(health[0].attributes["instanceId"], task_arn("t1").as_str());

    assert_eq!(
        result.evicted(Namespace::Tasks),
        ["ecs;tasks;other;us-east-1;x".to_string(), keys.task("t2")]
    );
    assert_eq!(result.evicted(Namespace::Services), [keys.task_definition("web")]);
    assert_eq!(
        result.evicted(Namespace::TaskDefinitions),
        [keys.task_definition(&task_definition_arn("web"))]
    );
}

#[tokio::test]
async fn test_empty_snapshot_produces_empty_health() {
    let snapshot = Snapshot::new();
    let agent = agent(&snapshot.store, ScriptedTargetHealth::new());

    let result = agent.load_data(Evictions::new()).await.unwrap();
    assert!(result.records(Namespace::Health).is_empty());
    assert!(result.evictions.is_empty());
}

#[tokio::test]
async fn test_run_once_applies_pass_to_store() {
    let snapshot = mixed_snapshot();
    let runner = AgentRunner::new(
        agent(&snapshot.store, mixed_client()),
        snapshot.store.clone(),
        agent_config(None),
    );

    let summary = runner.run_once().await.unwrap();
    let keys = keys();

    assert_eq!(summary.written, 1);
    let health = snapshot.store.health(&keys.task_health("t1")).unwrap();
    assert_eq!(health["state"], "Up");
    assert_eq!(health["type"], "loadBalancer");

    assert!(snapshot.store.contains(&keys.task("t1")));
    assert!(!snapshot.store.contains(&keys.task("t2")));
    assert!(!snapshot
        .store
        .contains(&keys.task_definition(&task_definition_arn("web"))));
    // The service itself stays; its eviction key lives in another namespace.
    assert!(snapshot.store.contains(&keys.service("web")));
}

#[tokio::test]
async fn test_health_record_dropped_when_target_deregisters() {
    let snapshot = Snapshot::new()
        .task(interface_task("t1", "web", "10.0.0.5"))
        .service(service("web", "web", vec![load_balancer(Some("tg-1"), 80)]))
        .task_definition(task_definition("web", &[80]));
    let health_key = keys().task_health("t1");

    let healthy = AgentRunner::new(
        agent(&snapshot.store, mixed_client()),
        snapshot.store.clone(),
        agent_config(None),
    );
    healthy.run_once().await.unwrap();
    assert_eq!(snapshot.store.health(&health_key).unwrap()["state"], "Up");

    // Same store, target no longer registered.
    let deregistered = AgentRunner::new(
        agent(&snapshot.store, ScriptedTargetHealth::new()),
        snapshot.store.clone(),
        agent_config(None),
    );
    let summary = deregistered.run_once().await.unwrap();

    assert_eq!(summary.written, 0);
    assert_eq!(summary.superseded, 1);
    assert!(!snapshot.store.contains(&keys().task("t1")));
    assert!(snapshot.store.health(&health_key).is_none());

    let summary = deregistered.run_once().await.unwrap();
    assert_eq!(summary.superseded, 0);
    assert!(snapshot.store.health(&health_key).is_none());
}

#[tokio::test]
async fn test_reload_updates_pass_concurrency() {
    let snapshot = mixed_snapshot();
    let shared = agent_config(None);
    let mut runner = AgentRunner::new(
        agent(&snapshot.store, mixed_client()),
        snapshot.store.clone(),
        shared.clone(),
    );
    assert_eq!(runner.agent().max_concurrent_tasks(), 1);

    let mut updated = (**shared.load()).clone();
    updated.resolver.max_concurrent_tasks = 8;
    runner.reload(updated);

    assert_eq!(runner.agent().max_concurrent_tasks(), 8);
    assert_eq!(shared.load().resolver.max_concurrent_tasks, 8);
    assert_eq!(runner.run_once().await.unwrap().written, 1);
}

#[tokio::test]
async fn test_failed_pass_leaves_store_untouched() {
    let snapshot = mixed_snapshot();
    let client = ScriptedTargetHealth::new().reply("tg-1", "10.0.0.5", 80, Reply::Fail);
    let runner = AgentRunner::new(
        agent(&snapshot.store, client),
        snapshot.store.clone(),
        agent_config(None),
    );

    assert!(runner.run_once().await.is_err());

    let keys = keys();
    assert!(snapshot.store.health(&keys.task_health("t1")).is_none());
    assert!(snapshot.store.contains(&keys.task("t1")));
    assert!(snapshot.store.contains(&keys.task("t2")));
    assert!(snapshot
        .store
        .contains(&keys.task_definition(&task_definition_arn("web"))));
}

#[tokio::test]
async fn test_run_once_saves_snapshot_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let store = SnapshotStore::new(Some(path.clone()));
    let snapshot = Snapshot { store }
        .task(interface_task("t1", "web", "10.0.0.5"))
        .service(service("web", "web", vec![load_balancer(Some("tg-1"), 80)]))
        .task_definition(task_definition("web", &[80]));

    let runner = AgentRunner::new(
        agent(&snapshot.store, mixed_client()),
        snapshot.store.clone(),
        agent_config(Some(&path)),
    );
    runner.run_once().await.unwrap();

    let reloaded = SnapshotStore::load_from_file(&path).unwrap();
    let health = reloaded.health(&keys().task_health("t1")).unwrap();
    assert_eq!(health["state"], "Up");
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let snapshot = mixed_snapshot();
    let runner = AgentRunner::new(
        agent(&snapshot.store, mixed_client()),
        snapshot.store.clone(),
        agent_config(None),
    );

    let shutdown = Shutdown::new();
    let (_config_tx, config_rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = tokio::spawn(runner.run(config_rx, shutdown.subscribe()));

    // The first tick fires immediately.
    let health_key = keys().task_health("t1");
    tokio::time::timeout(Duration::from_secs(5), async {
        while snapshot.store.health(&health_key).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("first pass should apply");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("runner should stop")
        .unwrap();
}
