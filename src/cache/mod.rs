//! Cache snapshot subsystem.
//!
//! # Data Flow
//! ```text
//! snapshot file (JSON)
//!     → snapshot.rs (SnapshotStore: load, keyed lookups)
//!     → SnapshotProvider trait (read-only view for one pass)
//!     → resolver
//!
//! Pass result:
//!     → SnapshotStore::apply (write HEALTH, drop evicted keys)
//!     → optional save back to disk
//! ```
//!
//! # Design Decisions
//! - Keys are namespaced strings (keys.rs), identical to the host cache format
//! - The resolver only sees the read-only trait, never the store
//! - Store is shared via Arc; DashMap handles concurrent readers

pub mod data;
pub mod keys;
pub mod snapshot;

pub use data::{AgentDataType, Attributes, Authority, CacheData, CacheResult, Evictions};
pub use keys::{Keys, Namespace};
pub use snapshot::{SnapshotError, SnapshotProvider, SnapshotStore};
