//! redb table definitions for the schedsim cluster store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized objects).
//! Namespaced objects are keyed by `{namespace}/{name}`, cluster-scoped ones
//! by `{name}`.

use redb::TableDefinition;

use schedsim_core::ResourceKind;

pub const PODS: TableDefinition<&str, &[u8]> = TableDefinition::new("pods");

pub const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");

pub const PERSISTENT_VOLUMES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("persistent_volumes");

pub const PERSISTENT_VOLUME_CLAIMS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("persistent_volume_claims");

pub const STORAGE_CLASSES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("storage_classes");

pub const PRIORITY_CLASSES: TableDefinition<&str, &[u8]> =
    TableDefinition::new("priority_classes");

pub const NAMESPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("namespaces");

/// Active scheduler configuration under [`ACTIVE_SCHEDULER_CONFIG`].
pub const SCHEDULER: TableDefinition<&str, &[u8]> = TableDefinition::new("scheduler");

/// Store bookkeeping (the resource version counter).
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub const ACTIVE_SCHEDULER_CONFIG: &str = "active";
pub const REVISION: &str = "revision";

/// The table holding objects of `kind`.
pub fn table_for(kind: ResourceKind) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match kind {
        ResourceKind::Pod => PODS,
        ResourceKind::Node => NODES,
        ResourceKind::PersistentVolume => PERSISTENT_VOLUMES,
        ResourceKind::PersistentVolumeClaim => PERSISTENT_VOLUME_CLAIMS,
        ResourceKind::StorageClass => STORAGE_CLASSES,
        ResourceKind::PriorityClass => PRIORITY_CLASSES,
        ResourceKind::Namespace => NAMESPACES,
    }
}

/// Table key for an object.
pub fn object_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}
