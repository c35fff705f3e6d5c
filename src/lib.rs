//! ECS task health caching agent library.

pub mod agent;
pub mod cache;
pub mod config;
pub mod ecs;
pub mod health;
pub mod lifecycle;
pub mod observability;

pub use agent::{AgentRunner, TaskHealthCachingAgent};
pub use config::AgentConfig;
pub use lifecycle::Shutdown;
