//! In-memory fakes for the port traits.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use schedsim_core::{
    ObjectMeta, ObjectMetaApply, PortError, PortResult, Resource, ResourcePort, SchedulerConfig,
    SchedulerControl,
};

use crate::service::Ports;

/// A resource port backed by a vector, with failure injection.
pub struct FakePort<K: Resource> {
    items: Mutex<Vec<K>>,
    applied: Mutex<Vec<K::Desired>>,
    deleted: Mutex<Vec<String>>,
    fail_list: bool,
    fail_apply: Mutex<HashSet<String>>,
    fail_all_applies: bool,
    fail_deletes: bool,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    gets: AtomicUsize,
}

impl<K: Resource> Default for FakePort<K> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            applied: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            fail_list: false,
            fail_apply: Mutex::new(HashSet::new()),
            fail_all_applies: false,
            fail_deletes: false,
            delay: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }
}

impl<K: Resource> FakePort<K> {
    pub fn with_items(items: Vec<K>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Self::default()
        }
    }

    pub fn failing_applies() -> Self {
        Self {
            fail_all_applies: true,
            ..Self::default()
        }
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_apply_of(self, name: &str) -> Self {
        self.fail_apply.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn applied(&self) -> Vec<K::Desired> {
        self.applied.lock().unwrap().clone()
    }

    pub fn applied_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .applied()
            .iter()
            .map(|d| K::desired_metadata(d).name().to_string())
            .collect();
        names.sort();
        names
    }

    pub fn deleted_names(&self) -> Vec<String> {
        let mut names = self.deleted.lock().unwrap().clone();
        names.sort();
        names
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn stored_meta(meta: ObjectMetaApply) -> ObjectMeta {
    let name = meta.name.unwrap_or_default();
    ObjectMeta {
        uid: Some(format!("dest-{name}")),
        name,
        namespace: meta.namespace,
        labels: meta.labels,
        annotations: meta.annotations,
        extra: meta.extra,
        ..ObjectMeta::default()
    }
}

#[async_trait]
impl<K: Resource> ResourcePort<K> for FakePort<K> {
    async fn list(&self, namespace: Option<&str>) -> PortResult<Vec<K>> {
        self.pause().await;
        if self.fail_list {
            return Err(PortError::Backend(format!("list {} refused", K::KIND)));
        }
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|k| namespace.is_none() || k.metadata().namespace.as_deref() == namespace)
            .cloned()
            .collect())
    }

    async fn get(&self, name: &str, namespace: Option<&str>) -> PortResult<K> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|k| k.metadata().name == name && k.metadata().namespace.as_deref() == namespace)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("{} {name}", K::KIND)))
    }

    async fn apply(&self, desired: K::Desired) -> PortResult<K> {
        self.pause().await;
        let name = K::desired_metadata(&desired).name().to_string();
        if self.fail_all_applies || self.fail_apply.lock().unwrap().contains(&name) {
            return Err(PortError::Backend(format!("apply {} {name} refused", K::KIND)));
        }
        if K::desired_metadata(&desired).uid.is_some() {
            return Err(PortError::Backend("uid must be empty on apply".to_string()));
        }
        self.applied.lock().unwrap().push(desired.clone());
        let stored = K::from_desired(desired, stored_meta);
        let mut items = self.items.lock().unwrap();
        items.retain(|k| {
            k.metadata().name != stored.metadata().name
                || k.metadata().namespace != stored.metadata().namespace
        });
        items.push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, name: &str, namespace: Option<&str>) -> PortResult<()> {
        self.pause().await;
        if self.fail_deletes {
            return Err(PortError::Backend(format!("delete {} {name} refused", K::KIND)));
        }
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|k| {
            k.metadata().name != name || k.metadata().namespace.as_deref() != namespace
        });
        if items.len() == before {
            return Err(PortError::NotFound(format!("{} {name}", K::KIND)));
        }
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Scheduler control with a scripted answer.
#[derive(Default)]
pub struct FakeScheduler {
    pub config: Mutex<Option<SchedulerConfig>>,
    pub answer: Option<PortError>,
    pub restarts: AtomicUsize,
}

impl FakeScheduler {
    pub fn answering(error: PortError) -> Self {
        Self {
            answer: Some(error),
            ..Self::default()
        }
    }

    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulerControl for FakeScheduler {
    async fn get_config(&self) -> PortResult<SchedulerConfig> {
        if let Some(e) = &self.answer {
            return Err(e.clone());
        }
        Ok(self.config.lock().unwrap().clone().unwrap_or_default())
    }

    async fn restart(&self, config: Option<SchedulerConfig>) -> PortResult<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.answer {
            return Err(e.clone());
        }
        *self.config.lock().unwrap() = config;
        Ok(())
    }
}

/// One fake per kind, kept around so tests can inspect them.
#[derive(Default)]
pub struct Fakes {
    pub pods: Arc<FakePort<schedsim_core::Pod>>,
    pub nodes: Arc<FakePort<schedsim_core::Node>>,
    pub pvs: Arc<FakePort<schedsim_core::PersistentVolume>>,
    pub pvcs: Arc<FakePort<schedsim_core::PersistentVolumeClaim>>,
    pub storage_classes: Arc<FakePort<schedsim_core::StorageClass>>,
    pub priority_classes: Arc<FakePort<schedsim_core::PriorityClass>>,
    pub namespaces: Arc<FakePort<schedsim_core::Namespace>>,
    pub scheduler: Arc<FakeScheduler>,
}

impl Fakes {
    pub fn ports(&self) -> Ports {
        Ports {
            pods: self.pods.clone(),
            nodes: self.nodes.clone(),
            pvs: self.pvs.clone(),
            pvcs: self.pvcs.clone(),
            storage_classes: self.storage_classes.clone(),
            priority_classes: self.priority_classes.clone(),
            namespaces: self.namespaces.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

/// Log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Route events on the current thread into this buffer until the guard
    /// is dropped.
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
