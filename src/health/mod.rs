//! Task health resolution.
//!
//! # Data Flow
//! ```text
//! For each cached task (resolver.rs):
//!     → resolve service / task definition / container instance from snapshot
//!     → network.rs (classify Bridge | Interface | Unresolvable)
//!     → network.rs (port match, build query target) per load balancer
//!     → target.rs (live DescribeTargetHealth)
//!         - non-empty → record.rs (TaskHealth, Up | Unknown)
//!         - empty     → eviction.rs (task, service, task definition keys)
//!
//! After all tasks:
//!     → record.rs (flatten to HEALTH cache data, merge evictions)
//! ```
//!
//! # Design Decisions
//! - Missing references and port mismatches are skips, never errors
//! - An empty live result is a staleness signal and triggers eviction
//! - A failed live query aborts the whole pass; nothing partial is returned
//! - Accumulators are per task and merged afterwards; no shared mutable state

pub mod eviction;
pub mod network;
pub mod record;
pub mod resolver;
pub mod target;

pub use eviction::{EvictionReason, EvictionSet};
pub use network::{NetworkMode, ResolveTarget};
pub use record::{HealthState, TaskHealth};
pub use resolver::{Resolution, TaskHealthResolver};
pub use target::{
    HttpTargetHealthClient, TargetDescription, TargetHealthClient, TargetHealthDescription,
    TargetHealthError,
};
