//! ECS task health caching agent.
//!
//! Reconciles load balancer target health with a cached inventory of ECS
//! tasks, writing authoritative HEALTH records and evicting stale entries.
//!
//! # Architecture Overview
//!
//! ```text
//!   snapshot.json
//!        │ load
//!        ▼
//!   SnapshotStore ◀──────────── apply (HEALTH + evictions) ───────────┐
//!        │ read-only                                                  │
//!        ▼                                                            │
//!   runner tick → caching agent → resolver (per task)                 │
//!                                   ├─ network mode + port match      │
//!                                   └─ DescribeTargetHealth ──▶ gateway
//!                                 → CacheResult ─────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use ecs_task_health::agent::{AgentRunner, TaskHealthCachingAgent};
use ecs_task_health::cache::SnapshotStore;
use ecs_task_health::config::{self, load_config, watcher::ConfigWatcher};
use ecs_task_health::health::HttpTargetHealthClient;
use ecs_task_health::lifecycle::{signals, Shutdown};
use ecs_task_health::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "ecs-task-health")]
#[command(about = "Caches ECS task health from load balancer target health", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "task-health.toml")]
    config: PathBuf,

    /// Run a single pass and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        account = %config.account.name,
        region = %config.account.region,
        interval_secs = config.schedule.interval_secs,
        "ecs-task-health starting"
    );

    if config.observability.metrics_enabled {
        // Validated on load.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let run_once = cli.once || config.schedule.run_once;
    let store = SnapshotStore::load_from_file(&PathBuf::from(&config.snapshot.path))?;
    let shared = config::shared(config.clone());
    let client = HttpTargetHealthClient::new(shared.clone());

    let agent = TaskHealthCachingAgent::new(
        config.account.name.clone(),
        config.account.region.clone(),
        Arc::new(store.clone()),
        Arc::new(client),
    )
    .with_concurrency(config.resolver.max_concurrent_tasks);

    let runner = AgentRunner::new(agent, store, shared);

    if run_once {
        runner.run_once().await?;
        return Ok(());
    }

    let (watcher, config_updates) = ConfigWatcher::new(&cli.config);
    // Dropping the watcher stops updates; keep it for the process lifetime.
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    runner.run(config_updates, shutdown.subscribe()).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
