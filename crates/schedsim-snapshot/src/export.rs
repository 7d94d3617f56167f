//! Export — capture every tracked collection concurrently.
//!
//! One task per resource kind plus one for the scheduler configuration run
//! through a [`TaskGroup`]. In strict mode the first failing fetch aborts the
//! export; in lenient mode it is logged and replaced by an empty collection.

use std::sync::Arc;

use tracing::{debug, error, info};

use schedsim_core::reserved::is_excluded;
use schedsim_core::{
    Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, PortError, PriorityClass,
    Resource, ResourcePort, SchedulerConfig, SchedulerControl, StorageClass,
};

use crate::error::{SnapshotError, SnapshotResult};
use crate::executor::TaskGroup;
use crate::options::Options;
use crate::service::SnapshotService;
use crate::snapshot::Snapshot;

/// Output of one export task.
enum Fetched {
    Pods(Vec<Pod>),
    Nodes(Vec<Node>),
    Pvs(Vec<PersistentVolume>),
    Pvcs(Vec<PersistentVolumeClaim>),
    StorageClasses(Vec<StorageClass>),
    PriorityClasses(Vec<PriorityClass>),
    Namespaces(Vec<Namespace>),
    SchedulerConfig(Option<SchedulerConfig>),
}

impl SnapshotService {
    /// Capture the current cluster state.
    pub async fn export(&self, options: Options) -> SnapshotResult<Snapshot> {
        let ports = &self.ports;
        let mut group = TaskGroup::new(self.max_concurrency);

        spawn_list(&mut group, &ports.pods, options, Fetched::Pods).await?;
        spawn_list(&mut group, &ports.nodes, options, Fetched::Nodes).await?;
        spawn_list(&mut group, &ports.pvs, options, Fetched::Pvs).await?;
        spawn_list(&mut group, &ports.pvcs, options, Fetched::Pvcs).await?;
        spawn_list(&mut group, &ports.storage_classes, options, Fetched::StorageClasses).await?;
        spawn_list(&mut group, &ports.priority_classes, options, Fetched::PriorityClasses).await?;
        spawn_list(&mut group, &ports.namespaces, options, Fetched::Namespaces).await?;

        let scheduler = ports.scheduler.clone();
        group
            .spawn(async move {
                fetch_scheduler_config(scheduler, options)
                    .await
                    .map(Fetched::SchedulerConfig)
            })
            .await?;

        let mut snapshot = Snapshot::default();
        for fetched in group.wait().await? {
            match fetched {
                Fetched::Pods(items) => snapshot.pods = items,
                Fetched::Nodes(items) => snapshot.nodes = items,
                Fetched::Pvs(items) => snapshot.pvs = items,
                Fetched::Pvcs(items) => snapshot.pvcs = items,
                Fetched::StorageClasses(items) => snapshot.storage_classes = items,
                Fetched::PriorityClasses(items) => snapshot.priority_classes = items,
                Fetched::Namespaces(items) => snapshot.namespaces = items,
                Fetched::SchedulerConfig(config) => snapshot.scheduler_config = config,
            }
        }

        if let Some(decorator) = &self.decorator {
            for pod in &mut snapshot.pods {
                decorator.decorate(pod);
            }
        }

        info!(
            pods = snapshot.pods.len(),
            nodes = snapshot.nodes.len(),
            pvs = snapshot.pvs.len(),
            pvcs = snapshot.pvcs.len(),
            storage_classes = snapshot.storage_classes.len(),
            priority_classes = snapshot.priority_classes.len(),
            namespaces = snapshot.namespaces.len(),
            scheduler_config = snapshot.scheduler_config.is_some(),
            "snapshot exported"
        );
        Ok(snapshot)
    }
}

async fn spawn_list<K: Resource>(
    group: &mut TaskGroup<Fetched>,
    port: &Arc<dyn ResourcePort<K>>,
    options: Options,
    wrap: fn(Vec<K>) -> Fetched,
) -> SnapshotResult<()> {
    let port = port.clone();
    group
        .spawn(async move { list_kind(port, options).await.map(wrap) })
        .await
}

pub(crate) async fn list_kind<K: Resource>(
    port: Arc<dyn ResourcePort<K>>,
    options: Options,
) -> SnapshotResult<Vec<K>> {
    let mut items = match port.list(None).await {
        Ok(items) => items,
        Err(e) if options.ignore_errors => {
            error!(kind = %K::KIND, error = %e, "failed to list resources");
            return Ok(Vec::new());
        }
        Err(e) => return Err(SnapshotError::List { kind: K::KIND, source: e }),
    };

    let listed = items.len();
    items.retain(|item| {
        let meta = item.metadata();
        !is_excluded(K::KIND, &meta.name, meta.namespace.as_deref())
    });
    debug!(kind = %K::KIND, listed, kept = items.len(), "listed resources");
    Ok(items)
}

async fn fetch_scheduler_config(
    scheduler: Arc<dyn SchedulerControl>,
    options: Options,
) -> SnapshotResult<Option<SchedulerConfig>> {
    match scheduler.get_config().await {
        Ok(config) => Ok(Some(config)),
        Err(PortError::Disabled) => {
            debug!("scheduler service is disabled, exporting without scheduler config");
            Ok(None)
        }
        Err(e) if options.ignore_errors => {
            error!(error = %e, "failed to get scheduler config");
            Ok(None)
        }
        Err(e) => Err(SnapshotError::SchedulerConfig(e)),
    }
}
