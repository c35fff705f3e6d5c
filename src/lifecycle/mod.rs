//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → runner finishes current pass → loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - A pass in flight is never cut short; shutdown is observed between passes
//! - Config reload is file-driven (config::watcher), not signal-driven

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
