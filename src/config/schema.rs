//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the task health agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Account and region this agent caches.
    pub account: AccountConfig,

    /// Cache snapshot location.
    pub snapshot: SnapshotConfig,

    /// Live target health API.
    pub target_health: TargetHealthConfig,

    /// Resolution pass tuning.
    pub resolver: ResolverConfig,

    /// Pass scheduling.
    pub schedule: ScheduleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Account and region.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AccountConfig {
    /// Account name used in cache keys (e.g., "prod").
    pub name: String,

    /// AWS region (e.g., "us-west-2").
    pub region: String,
}

/// Snapshot store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path to the JSON snapshot file.
    pub path: String,

    /// Write the snapshot back after each applied pass.
    pub save_on_apply: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: "snapshot.json".to_string(),
            save_on_apply: false,
        }
    }
}

/// Target health API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetHealthConfig {
    /// URL accepting DescribeTargetHealth requests as JSON.
    pub endpoint: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TargetHealthConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8400/describe-target-health".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Resolution pass configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Tasks resolved concurrently (1 = sequential).
    pub max_concurrent_tasks: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 1,
        }
    }
}

/// Pass scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between passes.
    pub interval_secs: u64,

    /// Run a single pass and exit.
    pub run_once: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            run_once: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
