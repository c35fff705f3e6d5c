//! Config file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so that
//! editors which save by renaming a temp file over the config keep working.
//! Only loads that validate and differ from the last forwarded config reach
//! the runner.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AgentConfig;

/// Forwards reloaded agent configs to the runner.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AgentConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end the runner listens on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AgentConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let config_path = path.clone();
        let mut last_sent: Option<AgentConfig> = None;
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_config(&event, &config_path) => {
                    let Some(config) = reload(&config_path) else {
                        return;
                    };
                    if last_sent.as_ref() == Some(&config) {
                        tracing::debug!(path = %config_path.display(), "Config unchanged, skipping reload");
                        return;
                    }
                    tracing::info!(
                        path = %config_path.display(),
                        interval_secs = config.schedule.interval_secs,
                        max_concurrent_tasks = config.resolver.max_concurrent_tasks,
                        endpoint = %config.target_health.endpoint,
                        "Config change detected"
                    );
                    if update_tx.send(config.clone()).is_ok() {
                        last_sent = Some(config);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(path = %config_path.display(), error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path) -> Option<AgentConfig> {
    match load_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Invalid config on reload, keeping current configuration"
            );
            None
        }
    }
}

/// Whether a filesystem event writes or creates the config file.
fn touches_config(event: &Event, config_path: &Path) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    let Some(name) = config_path.file_name() else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(name))
}
