//! Periodic pass runner.
//!
//! # Responsibilities
//! - Tick at the configured interval and run one agent pass per tick
//! - Apply successful passes to the snapshot store
//! - Pick up reloaded configuration between passes
//! - Stop on shutdown

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::agent::caching_agent::{AgentResult, TaskHealthCachingAgent};
use crate::cache::data::Evictions;
use crate::cache::snapshot::{ApplySummary, SnapshotStore};
use crate::config::{AgentConfig, SharedConfig};

/// Drives a caching agent against a snapshot store.
pub struct AgentRunner {
    agent: TaskHealthCachingAgent,
    store: SnapshotStore,
    config: SharedConfig,
}

impl AgentRunner {
    /// `store` must be the same store the agent reads its snapshot from.
    pub fn new(agent: TaskHealthCachingAgent, store: SnapshotStore, config: SharedConfig) -> Self {
        Self {
            agent,
            store,
            config,
        }
    }

    /// Run one pass and apply it to the store.
    pub async fn run_once(&self) -> AgentResult<ApplySummary> {
        let result = self.agent.load_data(Evictions::new()).await?;
        let summary = self.store.apply(self.agent.keys(), &result);

        tracing::info!(
            agent = %self.agent.agent_type(),
            written = summary.written,
            evicted = summary.evicted,
            superseded = summary.superseded,
            "Applied task health pass"
        );

        if self.config.load().snapshot.save_on_apply {
            if let Err(e) = self.store.save_to_file() {
                tracing::error!(error = %e, "Failed to save snapshot");
            }
        }

        Ok(summary)
    }

    /// Run passes until shutdown.
    pub async fn run(
        mut self,
        mut config_updates: mpsc::UnboundedReceiver<AgentConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut interval_secs = self.config.load().schedule.interval_secs;
        let mut ticker = build_ticker(interval_secs);

        tracing::info!(
            agent = %self.agent.agent_type(),
            interval = interval_secs,
            "Task health runner starting"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Task health runner received shutdown signal, exiting loop");
                    break;
                }
                Some(new_config) = config_updates.recv() => {
                    self.reload(new_config);
                    let new_interval = self.config.load().schedule.interval_secs;
                    if new_interval != interval_secs {
                        interval_secs = new_interval;
                        ticker = build_ticker(interval_secs);
                        tracing::info!(interval = interval_secs, "Pass interval updated");
                    }
                }
                _ = ticker.tick() => {
                    // Failures are already logged by the agent; the next tick retries.
                    let _ = self.run_once().await;
                }
            }
        }
    }

    /// Swap in a reloaded config.
    ///
    /// Pass concurrency applies from the next pass. Account, region and
    /// snapshot path are bound at startup and only change on restart.
    pub fn reload(&mut self, new_config: AgentConfig) {
        let current = self.config.load_full();
        if new_config.account != current.account {
            tracing::warn!(
                current = %self.agent.agent_type(),
                "Account or region changed in config; restart required to apply"
            );
        }
        if new_config.snapshot.path != current.snapshot.path {
            tracing::warn!(
                current = %current.snapshot.path,
                requested = %new_config.snapshot.path,
                "Snapshot path changed in config; restart required to apply"
            );
        }

        let concurrency = new_config.resolver.max_concurrent_tasks;
        if concurrency != self.agent.max_concurrent_tasks() {
            self.agent = self.agent.clone().with_concurrency(concurrency);
            tracing::info!(max_concurrent_tasks = concurrency, "Pass concurrency updated");
        }

        self.config.store(Arc::new(new_config));
        tracing::info!("Configuration reloaded");
    }

    pub fn agent(&self) -> &TaskHealthCachingAgent {
        &self.agent
    }
}

fn build_ticker(interval_secs: u64) -> Interval {
    let mut ticker = time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
