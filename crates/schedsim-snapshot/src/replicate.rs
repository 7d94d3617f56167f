//! Replicate — copy an existing cluster into this one.

use tracing::info;

use crate::error::SnapshotResult;
use crate::options::Options;
use crate::service::{Ports, SnapshotService};

impl SnapshotService {
    /// Export everything behind `source` and import it here.
    ///
    /// The same options govern both halves. The export runs under this
    /// service's concurrency ceiling but without its pod decorator, so
    /// decisions recorded here never leak onto copied pods.
    pub async fn replicate(&self, source: Ports, options: Options) -> SnapshotResult<()> {
        let snapshot = SnapshotService::new(source)
            .with_max_concurrency(self.max_concurrency)
            .export(options)
            .await?;
        let objects = snapshot.object_count();
        self.import(snapshot.into_import(), options).await?;
        info!(objects, "cluster replicated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use schedsim_core::{Namespace, Node, Pod, PortError, SchedulerConfig};

    use crate::error::SnapshotError;
    use crate::testing::{FakePort, FakeScheduler, Fakes};

    use super::*;

    fn source() -> Fakes {
        let scheduler = FakeScheduler::default();
        *scheduler.config.lock().unwrap() = Some(SchedulerConfig {
            parallelism: Some(8),
            ..SchedulerConfig::default()
        });
        Fakes {
            namespaces: Arc::new(FakePort::with_items(vec![
                Namespace::new("team-a", None),
                Namespace::new("kube-system", None),
            ])),
            pods: Arc::new(FakePort::with_items(vec![
                Pod::new("web", Some("team-a")),
                Pod::new("coredns", Some("kube-system")),
            ])),
            nodes: Arc::new(FakePort::with_items(vec![Node::new("node-1", None)])),
            scheduler: Arc::new(scheduler),
            ..Fakes::default()
        }
    }

    #[tokio::test]
    async fn copies_user_objects_and_scheduler_config() {
        let source = source();
        let dest = Fakes::default();
        let service = SnapshotService::new(dest.ports());

        service
            .replicate(source.ports(), Options::strict())
            .await
            .unwrap();

        assert_eq!(dest.namespaces.applied_names(), ["team-a"]);
        assert_eq!(dest.pods.applied_names(), ["web"]);
        assert_eq!(dest.nodes.applied_names(), ["node-1"]);
        let config = dest.scheduler.config.lock().unwrap().clone().unwrap();
        assert_eq!(config.parallelism, Some(8));
    }

    #[tokio::test]
    async fn strict_source_failure_applies_nothing() {
        let mut source = source();
        source.nodes = Arc::new(FakePort::failing_list());
        let dest = Fakes::default();
        let service = SnapshotService::new(dest.ports());

        let err = service
            .replicate(source.ports(), Options::strict())
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::List { .. }));
        assert!(dest.namespaces.applied().is_empty());
        assert_eq!(dest.scheduler.restarts(), 0);
    }

    #[tokio::test]
    async fn disabled_source_scheduler_restarts_destination_with_default() {
        let mut source = source();
        source.scheduler = Arc::new(FakeScheduler::answering(PortError::Disabled));
        let dest = Fakes::default();
        let service = SnapshotService::new(dest.ports());

        service
            .replicate(source.ports(), Options::strict())
            .await
            .unwrap();

        assert_eq!(dest.scheduler.restarts(), 1);
        assert_eq!(*dest.scheduler.config.lock().unwrap(), None);
        assert_eq!(dest.pods.applied_names(), ["web"]);
    }
}
