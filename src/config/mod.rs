//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<AgentConfig>> to runner and clients
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → runner swaps the shared config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Account and region are fixed for the process lifetime

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

use arc_swap::ArcSwap;
use std::sync::Arc;

pub use loader::{load_config, ConfigError};
pub use schema::AccountConfig;
pub use schema::AgentConfig;
pub use schema::ObservabilityConfig;
pub use schema::ResolverConfig;
pub use schema::ScheduleConfig;
pub use schema::SnapshotConfig;
pub use schema::TargetHealthConfig;

/// Live configuration shared between the runner and the clients it drives.
pub type SharedConfig = Arc<ArcSwap<AgentConfig>>;

/// Wrap a config for sharing.
pub fn shared(config: AgentConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
