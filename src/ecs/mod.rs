//! ECS entity model.
//!
//! # Data Flow
//! ```text
//! Prior cache snapshot (JSON, camelCase like the ECS API)
//!     → model.rs (Task, Service, TaskDefinition, ContainerInstance)
//!     → read-only input to the health resolver
//! ```
//!
//! # Design Decisions
//! - Entities are plain data; no behavior beyond small accessors
//! - Missing lists deserialize as empty, missing scalars as `None`
//! - Only the primary (first) container drives networking decisions

pub mod model;

pub use model::{
    Container, ContainerDefinition, ContainerInstance, LoadBalancer, NetworkBinding,
    NetworkInterface, PortMapping, Service, Task, TaskDefinition,
};
