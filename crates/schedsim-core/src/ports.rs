//! Traits the snapshot orchestrator consumes.
//!
//! A backing store provides one [`ResourcePort`] per tracked kind plus a
//! [`SchedulerControl`]. Implementations are expected to be cheap to share
//! (`Arc<dyn ...>`) and to make every single call atomic.

use async_trait::async_trait;

use crate::error::PortResult;
use crate::resources::{Pod, Resource};
use crate::scheduler_config::SchedulerConfig;

/// List/Get/Apply/Delete access to one resource kind.
#[async_trait]
pub trait ResourcePort<K: Resource>: Send + Sync {
    /// List objects. `None` lists across all namespaces.
    async fn list(&self, namespace: Option<&str>) -> PortResult<Vec<K>>;

    async fn get(&self, name: &str, namespace: Option<&str>) -> PortResult<K>;

    /// Create-or-update. The caller must have cleared `metadata.uid`.
    async fn apply(&self, desired: K::Desired) -> PortResult<K>;

    async fn delete(&self, name: &str, namespace: Option<&str>) -> PortResult<()>;
}

/// Control over the simulated scheduler.
#[async_trait]
pub trait SchedulerControl: Send + Sync {
    /// Current configuration, or `PortError::Disabled`.
    async fn get_config(&self) -> PortResult<SchedulerConfig>;

    /// Restart with `config`; `None` restarts with the default configuration.
    async fn restart(&self, config: Option<SchedulerConfig>) -> PortResult<()>;
}

/// Hook applied to every pod as it is assembled for export.
pub trait PodDecorator: Send + Sync {
    fn decorate(&self, pod: &mut Pod);
}
