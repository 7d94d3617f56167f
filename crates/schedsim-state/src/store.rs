//! ClusterStore — redb-backed object storage for every tracked kind.
//!
//! Provides typed create-or-update, get, list and delete over the resource
//! tables. All values are JSON-serialized into redb's `&[u8]` value columns.
//! The store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use schedsim_core::reserved::DEFAULT_NAMESPACE;
use schedsim_core::{ObjectMeta, PortError, PortResult, Resource, ResourcePort};

use crate::error::{StateError, StateResult};
use crate::scheduler::SchedulerStore;
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

pub(crate) use map_err;

/// Thread-safe cluster store backed by redb.
#[derive(Clone)]
pub struct ClusterStore {
    db: Arc<Database>,
}

impl ClusterStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "cluster store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory cluster store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PODS).map_err(map_err!(Table))?;
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.open_table(PERSISTENT_VOLUMES).map_err(map_err!(Table))?;
        txn.open_table(PERSISTENT_VOLUME_CLAIMS).map_err(map_err!(Table))?;
        txn.open_table(STORAGE_CLASSES).map_err(map_err!(Table))?;
        txn.open_table(PRIORITY_CLASSES).map_err(map_err!(Table))?;
        txn.open_table(NAMESPACES).map_err(map_err!(Table))?;
        txn.open_table(SCHEDULER).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Scheduler control sharing this store's database.
    ///
    /// With `external` set, every configuration call answers `Disabled`.
    pub fn scheduler(&self, external: bool) -> SchedulerStore {
        SchedulerStore::new(self.db.clone(), external)
    }

    /// The same store as a port for kind `K`.
    pub fn port<K: Resource>(&self) -> Arc<dyn ResourcePort<K>> {
        Arc::new(self.clone())
    }

    // ── Objects ────────────────────────────────────────────────────

    /// Create-or-update an object from its desired state.
    ///
    /// A new object gets a fresh uid; an existing one keeps its uid and
    /// creation timestamp. Every write bumps the resource version.
    pub fn put<K: Resource>(&self, mut desired: K::Desired) -> StateResult<K> {
        let kind = K::KIND;
        let meta = K::desired_metadata_mut(&mut desired);
        let name = meta.name.clone().unwrap_or_default();
        if name.is_empty() {
            return Err(StateError::Invalid(format!("{kind}: metadata.name is required")));
        }
        if kind.is_namespaced() {
            if meta.namespace.as_deref().is_none_or(str::is_empty) {
                meta.namespace = Some(DEFAULT_NAMESPACE.to_string());
            }
        } else {
            meta.namespace = None;
        }
        let key = object_key(meta.namespace.as_deref(), &name);
        if meta.uid.is_some() {
            return Err(StateError::UidConflict(format!("{kind} {key}")));
        }
        meta.strip_server_populated();
        K::stamp_type(&mut desired);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let object = {
            let mut table = txn.open_table(table_for(kind)).map_err(map_err!(Table))?;
            let existing = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    let current: K = serde_json::from_slice(guard.value())
                        .map_err(map_err!(Deserialize))?;
                    Some(current.metadata().clone())
                }
                None => None,
            };

            let mut meta_table = txn.open_table(META).map_err(map_err!(Table))?;
            let revision = meta_table
                .get(REVISION)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            meta_table
                .insert(REVISION, revision)
                .map_err(map_err!(Write))?;

            let (uid, creation_timestamp) = match existing {
                Some(current) => (current.uid, current.creation_timestamp),
                None => (Some(uuid::Uuid::new_v4().to_string()), None),
            };
            let object = K::from_desired(desired, |applied| ObjectMeta {
                name: applied.name.unwrap_or_default(),
                namespace: applied.namespace,
                uid,
                resource_version: Some(revision.to_string()),
                creation_timestamp,
                labels: applied.labels,
                annotations: applied.annotations,
                extra: applied.extra,
            });

            let value = serde_json::to_vec(&object).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            object
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%kind, %key, "object applied");
        Ok(object)
    }

    /// Get an object by name (and namespace for namespaced kinds).
    pub fn get<K: Resource>(&self, name: &str, namespace: Option<&str>) -> StateResult<Option<K>> {
        let key = object_key(scoped(K::KIND, namespace), name);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_for(K::KIND)).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let object: K =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(object))
            }
            None => Ok(None),
        }
    }

    /// List objects of kind `K`, optionally restricted to one namespace.
    pub fn list<K: Resource>(&self, namespace: Option<&str>) -> StateResult<Vec<K>> {
        let prefix = scoped(K::KIND, namespace).map(|ns| format!("{ns}/"));
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_for(K::KIND)).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if let Some(prefix) = &prefix {
                if !key.value().starts_with(prefix.as_str()) {
                    continue;
                }
            }
            let object: K =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(object);
        }
        Ok(results)
    }

    /// Delete an object. Returns true if it existed.
    pub fn remove<K: Resource>(&self, name: &str, namespace: Option<&str>) -> StateResult<bool> {
        let key = object_key(scoped(K::KIND, namespace), name);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table_for(K::KIND)).map_err(map_err!(Table))?;
            existed = table
                .remove(key.as_str())
                .map_err(map_err!(Write))?
                .is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(kind = %K::KIND, %key, existed, "object deleted");
        Ok(existed)
    }
}

/// Cluster-scoped kinds ignore any namespace they are asked about.
fn scoped(kind: schedsim_core::ResourceKind, namespace: Option<&str>) -> Option<&str> {
    if kind.is_namespaced() { namespace } else { None }
}

#[async_trait]
impl<K: Resource> ResourcePort<K> for ClusterStore {
    async fn list(&self, namespace: Option<&str>) -> PortResult<Vec<K>> {
        Ok(ClusterStore::list::<K>(self, namespace)?)
    }

    async fn get(&self, name: &str, namespace: Option<&str>) -> PortResult<K> {
        ClusterStore::get::<K>(self, name, namespace)?.ok_or_else(|| {
            PortError::NotFound(format!(
                "{} {}",
                K::KIND,
                object_key(scoped(K::KIND, namespace), name)
            ))
        })
    }

    async fn apply(&self, desired: K::Desired) -> PortResult<K> {
        Ok(self.put::<K>(desired)?)
    }

    async fn delete(&self, name: &str, namespace: Option<&str>) -> PortResult<()> {
        if ClusterStore::remove::<K>(self, name, namespace)? {
            Ok(())
        } else {
            Err(PortError::NotFound(format!(
                "{} {}",
                K::KIND,
                object_key(scoped(K::KIND, namespace), name)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsim_core::*;

    fn test_store() -> ClusterStore {
        ClusterStore::open_in_memory().unwrap()
    }

    fn pod(namespace: &str, name: &str) -> PodApply {
        Pod::new(name, Some(namespace)).into_desired()
    }

    #[test]
    fn apply_assigns_uid_and_type() {
        let store = test_store();
        let created: Pod = store.put::<Pod>(pod("team-a", "web")).unwrap();

        assert!(created.metadata.uid.is_some());
        assert_eq!(created.metadata.resource_version.as_deref(), Some("1"));
        assert_eq!(created.api_version.as_deref(), Some("v1"));
        assert_eq!(created.kind.as_deref(), Some("Pod"));
    }

    #[test]
    fn apply_keeps_uid_on_update() {
        let store = test_store();
        let first: Pod = store.put::<Pod>(pod("team-a", "web")).unwrap();

        let mut desired = pod("team-a", "web");
        desired
            .metadata
            .labels
            .insert("tier".to_string(), "front".to_string());
        let second: Pod = store.put::<Pod>(desired).unwrap();

        assert_eq!(first.metadata.uid, second.metadata.uid);
        assert_eq!(second.metadata.resource_version.as_deref(), Some("2"));
        assert_eq!(second.metadata.labels.get("tier").map(String::as_str), Some("front"));
    }

    #[test]
    fn apply_rejects_uid() {
        let store = test_store();
        let mut desired = pod("team-a", "web");
        desired.metadata.uid = Some("from-elsewhere".to_string());

        let result = store.put::<Pod>(desired);
        assert!(matches!(result, Err(StateError::UidConflict(_))));
    }

    #[test]
    fn apply_requires_name() {
        let store = test_store();
        let mut desired = pod("team-a", "web");
        desired.metadata.name = None;
        assert!(matches!(store.put::<Pod>(desired), Err(StateError::Invalid(_))));
    }

    #[test]
    fn namespaced_without_namespace_lands_in_default() {
        let store = test_store();
        let mut desired = pod("ignored", "web");
        desired.metadata.namespace = None;
        let created: Pod = store.put::<Pod>(desired).unwrap();
        assert_eq!(created.metadata.namespace.as_deref(), Some("default"));
        assert!(store.get::<Pod>("web", Some("default")).unwrap().is_some());
    }

    #[test]
    fn cluster_scoped_drops_namespace() {
        let store = test_store();
        let mut desired = Node::new("node-1", None).into_desired();
        desired.metadata.namespace = Some("team-a".to_string());
        let created: Node = store.put::<Node>(desired).unwrap();
        assert_eq!(created.metadata.namespace, None);
        assert!(store.get::<Node>("node-1", Some("whatever")).unwrap().is_some());
    }

    #[test]
    fn list_filters_by_namespace() {
        let store = test_store();
        store.put::<Pod>(pod("team-a", "web")).unwrap();
        store.put::<Pod>(pod("team-a", "db")).unwrap();
        store.put::<Pod>(pod("team-b", "web")).unwrap();

        assert_eq!(store.list::<Pod>(None).unwrap().len(), 3);
        assert_eq!(store.list::<Pod>(Some("team-a")).unwrap().len(), 2);
        assert!(store.list::<Pod>(Some("team-c")).unwrap().is_empty());
    }

    #[test]
    fn kinds_are_isolated() {
        let store = test_store();
        store.put::<Pod>(pod("team-a", "web")).unwrap();
        assert!(store.list::<Node>(None).unwrap().is_empty());
        assert!(store.list::<Namespace>(None).unwrap().is_empty());
    }

    #[test]
    fn delete_reports_existence() {
        let store = test_store();
        store.put::<Pod>(pod("team-a", "web")).unwrap();
        assert!(store.remove::<Pod>("web", Some("team-a")).unwrap());
        assert!(!store.remove::<Pod>("web", Some("team-a")).unwrap());
        assert!(store.get::<Pod>("web", Some("team-a")).unwrap().is_none());
    }

    #[tokio::test]
    async fn port_get_missing_is_not_found() {
        let store = test_store();
        let port = store.port::<PersistentVolumeClaim>();
        let err = port.get("data", Some("team-a")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn port_apply_with_uid_is_backend_error() {
        let store = test_store();
        let port = store.port::<Pod>();
        let mut desired = pod("team-a", "web");
        desired.metadata.uid = Some("stale".to_string());
        let err = port.apply(desired).await.unwrap_err();
        assert!(matches!(err, PortError::Backend(_)));
    }

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        let uid = {
            let store = ClusterStore::open(&db_path).unwrap();
            let created: Pod = store.put::<Pod>(pod("prod", "api")).unwrap();
            created.metadata.uid
        };

        // Reopen the same database file.
        let store = ClusterStore::open(&db_path).unwrap();
        let found = store.get::<Pod>("api", Some("prod")).unwrap().unwrap();
        assert_eq!(found.metadata.uid, uid);

        // The resource version counter continues where it left off.
        let updated: Pod = store.put::<Pod>(pod("prod", "api")).unwrap();
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("2"));
    }
}
