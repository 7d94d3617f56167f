//! schedsim-snapshot — cluster state export and import.
//!
//! Captures every tracked collection plus the scheduler configuration into a
//! [`Snapshot`] and replays an [`ImportSnapshot`] into another cluster. The
//! same service can wipe a cluster back to its initial state (`reset`) or
//! copy another cluster into it in one step (`replicate`). The orchestrator:
//!
//! - Fans out one fetch per kind under a concurrency ceiling
//! - Applies in phases with a barrier between each
//! - Skips reserved namespaces and priority classes both ways
//! - Aborts on the first failure, or logs and continues when lenient
//!
//! # Architecture
//!
//! ```text
//! SnapshotService
//!   ├── Ports (one ResourcePort per kind + SchedulerControl)
//!   ├── TaskGroup (semaphore ceiling, first-error propagation)
//!   └── PodDecorator (optional, applied to exported pods)
//! ```

pub mod error;
pub mod executor;
pub mod export;
pub mod import;
pub mod options;
pub mod replicate;
pub mod reset;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use error::{SnapshotError, SnapshotResult};
pub use executor::TaskGroup;
pub use import::Phase;
pub use options::Options;
pub use service::{Ports, SnapshotService};
pub use snapshot::{ImportSnapshot, Snapshot};
