//! SnapshotService — entry point for export and import.

use std::sync::Arc;

use schedsim_core::config::DEFAULT_MAX_CONCURRENCY;
use schedsim_core::{
    Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, PodDecorator, PriorityClass,
    ResourcePort, SchedulerControl, StorageClass,
};

/// The ports a snapshot service talks to.
#[derive(Clone)]
pub struct Ports {
    pub pods: Arc<dyn ResourcePort<Pod>>,
    pub nodes: Arc<dyn ResourcePort<Node>>,
    pub pvs: Arc<dyn ResourcePort<PersistentVolume>>,
    pub pvcs: Arc<dyn ResourcePort<PersistentVolumeClaim>>,
    pub storage_classes: Arc<dyn ResourcePort<StorageClass>>,
    pub priority_classes: Arc<dyn ResourcePort<PriorityClass>>,
    pub namespaces: Arc<dyn ResourcePort<Namespace>>,
    pub scheduler: Arc<dyn SchedulerControl>,
}

impl Ports {
    /// Use one backend for every resource kind.
    pub fn from_backend<B>(backend: Arc<B>, scheduler: Arc<dyn SchedulerControl>) -> Self
    where
        B: ResourcePort<Pod>
            + ResourcePort<Node>
            + ResourcePort<PersistentVolume>
            + ResourcePort<PersistentVolumeClaim>
            + ResourcePort<StorageClass>
            + ResourcePort<PriorityClass>
            + ResourcePort<Namespace>
            + 'static,
    {
        Self {
            pods: backend.clone(),
            nodes: backend.clone(),
            pvs: backend.clone(),
            pvcs: backend.clone(),
            storage_classes: backend.clone(),
            priority_classes: backend.clone(),
            namespaces: backend,
            scheduler,
        }
    }
}

/// Captures cluster state into a [`Snapshot`](crate::Snapshot) and replays
/// an [`ImportSnapshot`](crate::ImportSnapshot) into a cluster.
///
/// Export lives in [`crate::export`], import in [`crate::import`].
pub struct SnapshotService {
    pub(crate) ports: Ports,
    pub(crate) max_concurrency: usize,
    pub(crate) decorator: Option<Arc<dyn PodDecorator>>,
}

impl SnapshotService {
    pub fn new(ports: Ports) -> Self {
        Self {
            ports,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            decorator: None,
        }
    }

    /// Ceiling on tasks in flight during one export or one import phase.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    /// Decorate every exported pod (e.g. with recorded extender results).
    pub fn with_pod_decorator(mut self, decorator: Arc<dyn PodDecorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}
