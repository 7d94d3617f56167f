//! Reset — return a cluster to its freshly started state.
//!
//! Walks the import stages backwards so nothing is deleted while an object
//! that depends on it still exists:
//!
//! ```text
//! Volumes     persistent volumes ──── barrier
//!     │
//! Cluster     pods, nodes, claims, storage classes, priority classes ──── barrier
//!     │
//! Namespaces  ──── barrier
//!     │
//! Scheduler   restart with the default configuration
//! ```
//!
//! Reserved objects are never listed for deletion.

use std::sync::Arc;

use tracing::{debug, error, info};

use schedsim_core::{PortError, Resource, ResourcePort};

use crate::error::{SnapshotError, SnapshotResult};
use crate::executor::TaskGroup;
use crate::export::list_kind;
use crate::import::Phase;
use crate::options::Options;
use crate::service::SnapshotService;

impl SnapshotService {
    /// Delete every user object behind the ports and restart the scheduler
    /// with its default configuration.
    pub async fn reset(&self, options: Options) -> SnapshotResult<()> {
        let ports = &self.ports;
        let limit = self.max_concurrency;

        // ── Persistent volumes ────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            spawn_delete(&mut group, &ports.pvs, options).await?;
            group.wait().await
        }
        .await
        .map_err(|e| e.in_reset_phase(Phase::Volumes))?;

        // ── Cluster resources ─────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            spawn_delete(&mut group, &ports.pods, options).await?;
            spawn_delete(&mut group, &ports.nodes, options).await?;
            spawn_delete(&mut group, &ports.pvcs, options).await?;
            spawn_delete(&mut group, &ports.storage_classes, options).await?;
            spawn_delete(&mut group, &ports.priority_classes, options).await?;
            group.wait().await
        }
        .await
        .map_err(|e| e.in_reset_phase(Phase::Cluster))?;

        // ── Namespaces ────────────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            spawn_delete(&mut group, &ports.namespaces, options).await?;
            group.wait().await
        }
        .await
        .map_err(|e| e.in_reset_phase(Phase::Namespaces))?;

        // ── Scheduler ─────────────────────────────────────────────
        self.restart_scheduler(None, options)
            .await
            .map_err(|e| e.in_reset_phase(Phase::Scheduler))?;

        info!("cluster reset");
        Ok(())
    }
}

async fn spawn_delete<K: Resource>(
    group: &mut TaskGroup<()>,
    port: &Arc<dyn ResourcePort<K>>,
    options: Options,
) -> SnapshotResult<()> {
    for item in list_kind(port.clone(), options).await? {
        let meta = item.metadata();
        let name = meta.name.clone();
        let namespace = meta.namespace.clone();
        group
            .spawn(delete_one(port.clone(), name, namespace, options))
            .await?;
    }
    Ok(())
}

async fn delete_one<K: Resource>(
    port: Arc<dyn ResourcePort<K>>,
    name: String,
    namespace: Option<String>,
    options: Options,
) -> SnapshotResult<()> {
    match port.delete(&name, namespace.as_deref()).await {
        Ok(()) => Ok(()),
        Err(PortError::NotFound(_)) => {
            debug!(kind = %K::KIND, %name, "already deleted");
            Ok(())
        }
        Err(e) if options.ignore_errors => {
            error!(kind = %K::KIND, %name, error = %e, "failed to delete resource");
            Ok(())
        }
        Err(e) => Err(SnapshotError::Delete {
            kind: K::KIND,
            name,
            source: e,
        }),
    }
}
