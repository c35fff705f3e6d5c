//! Caching agent subsystem.
//!
//! # Data Flow
//! ```text
//! runner.rs (interval tick)
//!     → caching_agent.rs (one pass: resolve, build HEALTH data, merge evictions)
//!     → SnapshotStore::apply
//!     → optional snapshot save
//! ```
//!
//! # Design Decisions
//! - The agent computes; only the runner mutates the store
//! - A failed pass leaves the store untouched
//! - Agent identity is `<account>/<region>/TaskHealthCachingAgent`

pub mod caching_agent;
pub mod runner;

pub use caching_agent::{AgentError, AgentResult, TaskHealthCachingAgent};
pub use runner::AgentRunner;
