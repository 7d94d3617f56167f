//! Import — replay a snapshot in dependency order.
//!
//! ```text
//! Scheduler   restart with the imported configuration (serial)
//!     │
//! Namespaces  ──── barrier
//!     │
//! Cluster     priority classes, storage classes, claims, nodes, pods ──── barrier
//!     │
//! Volumes     persistent volumes, claim references rewritten
//! ```
//!
//! Each phase runs its applies through a fresh [`TaskGroup`] and waits for
//! all of them before the next phase starts. Nothing applied by an earlier
//! phase is rolled back when a later one fails.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use schedsim_core::reserved::is_excluded;
use schedsim_core::{
    PersistentVolumeApply, PersistentVolumeClaim, PortError, Resource, ResourcePort,
    SchedulerConfig,
};

use crate::error::{SnapshotError, SnapshotResult};
use crate::executor::TaskGroup;
use crate::options::Options;
use crate::service::SnapshotService;
use crate::snapshot::ImportSnapshot;

/// Ordered stage of an import. A reset walks the same stages in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scheduler,
    Namespaces,
    Cluster,
    Volumes,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Scheduler => "scheduler",
            Phase::Namespaces => "namespaces",
            Phase::Cluster => "cluster resources",
            Phase::Volumes => "persistent volumes",
        })
    }
}

impl SnapshotService {
    /// Replay `snapshot` into the cluster behind the ports.
    pub async fn import(&self, snapshot: ImportSnapshot, options: Options) -> SnapshotResult<()> {
        let ImportSnapshot {
            pods,
            nodes,
            pvs,
            pvcs,
            storage_classes,
            priority_classes,
            scheduler_config,
            namespaces,
        } = snapshot;
        let ports = &self.ports;
        let limit = self.max_concurrency;

        // ── Scheduler ─────────────────────────────────────────────
        if options.ignore_scheduler_config {
            debug!("leaving scheduler configuration untouched");
        } else {
            self.restart_scheduler(scheduler_config, options)
                .await
                .map_err(|e| e.in_phase(Phase::Scheduler))?;
        }

        // ── Namespaces ────────────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            spawn_apply(&mut group, &ports.namespaces, namespaces, options).await?;
            group.wait().await
        }
        .await
        .map_err(|e| e.in_phase(Phase::Namespaces))?;

        // ── Cluster resources ─────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            spawn_apply(&mut group, &ports.priority_classes, priority_classes, options).await?;
            spawn_apply(&mut group, &ports.storage_classes, storage_classes, options).await?;
            spawn_apply(&mut group, &ports.pvcs, pvcs, options).await?;
            spawn_apply(&mut group, &ports.nodes, nodes, options).await?;
            spawn_apply(&mut group, &ports.pods, pods, options).await?;
            group.wait().await
        }
        .await
        .map_err(|e| e.in_phase(Phase::Cluster))?;

        // ── Persistent volumes ────────────────────────────────────
        async {
            let mut group = TaskGroup::new(limit);
            for mut pv in pvs {
                if !admit::<schedsim_core::PersistentVolume>(&mut pv) {
                    continue;
                }
                let port = ports.pvs.clone();
                let claims = ports.pvcs.clone();
                group
                    .spawn(async move {
                        rebind_claim(&claims, &mut pv).await;
                        apply_one(port, pv, options).await
                    })
                    .await?;
            }
            group.wait().await
        }
        .await
        .map_err(|e| e.in_phase(Phase::Volumes))?;

        info!("snapshot imported");
        Ok(())
    }

    pub(crate) async fn restart_scheduler(
        &self,
        config: Option<SchedulerConfig>,
        options: Options,
    ) -> SnapshotResult<()> {
        match self.ports.scheduler.restart(config).await {
            Ok(()) => Ok(()),
            Err(PortError::Disabled) => {
                info!("scheduler service is disabled, skipping restart");
                Ok(())
            }
            Err(e) if options.ignore_errors => {
                error!(error = %e, "failed to restart scheduler");
                Ok(())
            }
            Err(e) => Err(SnapshotError::RestartScheduler(e)),
        }
    }
}

/// Decide whether `desired` is imported, clearing its uid if so.
fn admit<K: Resource>(desired: &mut K::Desired) -> bool {
    let meta = K::desired_metadata_mut(desired);
    if is_excluded(K::KIND, meta.name(), meta.namespace()) {
        debug!(kind = %K::KIND, name = meta.name(), "skipping reserved resource");
        return false;
    }
    meta.uid = None;
    meta.strip_server_populated();
    true
}

async fn spawn_apply<K: Resource>(
    group: &mut TaskGroup<()>,
    port: &Arc<dyn ResourcePort<K>>,
    items: Vec<K::Desired>,
    options: Options,
) -> SnapshotResult<()> {
    for mut desired in items {
        if !admit::<K>(&mut desired) {
            continue;
        }
        group.spawn(apply_one(port.clone(), desired, options)).await?;
    }
    Ok(())
}

async fn apply_one<K: Resource>(
    port: Arc<dyn ResourcePort<K>>,
    desired: K::Desired,
    options: Options,
) -> SnapshotResult<()> {
    let name = K::desired_metadata(&desired).name().to_string();
    match port.apply(desired).await {
        Ok(_) => Ok(()),
        Err(e) if options.ignore_errors => {
            error!(kind = %K::KIND, %name, error = %e, "failed to apply resource");
            Ok(())
        }
        Err(e) => Err(SnapshotError::Apply {
            kind: K::KIND,
            name,
            source: e,
        }),
    }
}

/// Point a bound volume's claim reference at the claim's uid in this
/// cluster. The old uid belongs to the source cluster; if the claim cannot be
/// found the reference keeps only name and namespace.
async fn rebind_claim(
    claims: &Arc<dyn ResourcePort<PersistentVolumeClaim>>,
    pv: &mut PersistentVolumeApply,
) {
    if !pv.is_bound() {
        return;
    }
    let Some(claim_ref) = pv.spec.claim_ref.as_mut() else {
        return;
    };
    let (Some(name), Some(namespace)) = (claim_ref.name.clone(), claim_ref.namespace.clone())
    else {
        error!(
            pv = pv.metadata.name(),
            claim = claim_ref.name.as_deref().unwrap_or_default(),
            namespace = claim_ref.namespace.as_deref().unwrap_or_default(),
            "claim reference of bound volume is incomplete, clearing claim uid"
        );
        claim_ref.uid = None;
        return;
    };

    match claims.get(&name, Some(&namespace)).await {
        Ok(claim) => {
            claim_ref.uid = claim.metadata.uid;
        }
        Err(e) => {
            error!(
                pv = pv.metadata.name(),
                claim = %name,
                %namespace,
                error = %e,
                "failed to get claim for bound volume, clearing claim uid"
            );
            claim_ref.uid = None;
        }
    }
}
