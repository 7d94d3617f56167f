//! Snapshot payloads.
//!
//! [`Snapshot`] is what an export produces; [`ImportSnapshot`] is what an
//! import consumes. Both serialize to the same JSON document shape, so a
//! file written by `export` can be fed straight back to `import`.

use serde::{Deserialize, Serialize};

use schedsim_core::{
    Namespace, NamespaceApply, Node, NodeApply, PersistentVolume, PersistentVolumeApply,
    PersistentVolumeClaim, PersistentVolumeClaimApply, Pod, PodApply, PriorityClass,
    PriorityClassApply, Resource, SchedulerConfig, StorageClass, StorageClassApply,
};

/// Cluster state captured by an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub pods: Vec<Pod>,
    pub nodes: Vec<Node>,
    pub pvs: Vec<PersistentVolume>,
    pub pvcs: Vec<PersistentVolumeClaim>,
    pub storage_classes: Vec<StorageClass>,
    pub priority_classes: Vec<PriorityClass>,
    pub scheduler_config: Option<SchedulerConfig>,
    pub namespaces: Vec<Namespace>,
}

/// Desired state to replay into a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportSnapshot {
    pub pods: Vec<PodApply>,
    pub nodes: Vec<NodeApply>,
    pub pvs: Vec<PersistentVolumeApply>,
    pub pvcs: Vec<PersistentVolumeClaimApply>,
    pub storage_classes: Vec<StorageClassApply>,
    pub priority_classes: Vec<PriorityClassApply>,
    pub scheduler_config: Option<SchedulerConfig>,
    pub namespaces: Vec<NamespaceApply>,
}

impl Snapshot {
    /// Total number of objects across all collections.
    pub fn object_count(&self) -> usize {
        self.pods.len()
            + self.nodes.len()
            + self.pvs.len()
            + self.pvcs.len()
            + self.storage_classes.len()
            + self.priority_classes.len()
            + self.namespaces.len()
    }

    /// Convert into an import payload, dropping server-populated metadata.
    pub fn into_import(self) -> ImportSnapshot {
        fn desired<K: Resource>(items: Vec<K>) -> Vec<K::Desired> {
            items.into_iter().map(K::into_desired).collect()
        }

        ImportSnapshot {
            pods: desired(self.pods),
            nodes: desired(self.nodes),
            pvs: desired(self.pvs),
            pvcs: desired(self.pvcs),
            storage_classes: desired(self.storage_classes),
            priority_classes: desired(self.priority_classes),
            scheduler_config: self.scheduler_config,
            namespaces: desired(self.namespaces),
        }
    }
}

impl ImportSnapshot {
    pub fn object_count(&self) -> usize {
        self.pods.len()
            + self.nodes.len()
            + self.pvs.len()
            + self.pvcs.len()
            + self.storage_classes.len()
            + self.priority_classes.len()
            + self.namespaces.len()
    }
}
