//! schedsim-core — shared model for the scheduler simulator.
//!
//! - [`resources`] — the tracked Kubernetes kinds and their desired-state form
//! - [`scheduler_config`] — scheduler configuration carried in snapshots
//! - [`reserved`] — reserved-name predicates
//! - [`ports`] — traits implemented by backing stores
//! - [`config`] — `schedsim.toml` parsing

pub mod config;
pub mod error;
pub mod ports;
pub mod reserved;
pub mod resources;
pub mod scheduler_config;

pub use config::SimConfig;
pub use error::{PortError, PortResult};
pub use ports::{PodDecorator, ResourcePort, SchedulerControl};
pub use resources::*;
pub use scheduler_config::{ExtenderConfig, SchedulerConfig, SchedulerProfile};
