pub mod config;
pub mod export;
pub mod import;
pub mod replicate;
pub mod reset;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use schedsim_core::SimConfig;
use schedsim_snapshot::{Options, Ports, SnapshotService};
use schedsim_state::ClusterStore;

const STORE_FILE: &str = "schedsim.redb";

/// Read the config file if one was given, then apply flag overrides.
pub fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<SimConfig> {
    let mut config = match path {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(data_dir) = data_dir {
        config.store.data_dir = data_dir;
    }
    Ok(config)
}

/// Open the cluster store under the configured data directory.
pub fn open_store(config: &SimConfig) -> anyhow::Result<ClusterStore> {
    open_store_at(&config.store.data_dir)
}

/// Open (or create) the cluster store kept in `dir`.
pub fn open_store_at(dir: &Path) -> anyhow::Result<ClusterStore> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create data dir {}", dir.display()))?;
    let path = dir.join(STORE_FILE);
    let store = ClusterStore::open(&path)
        .with_context(|| format!("failed to open cluster store {}", path.display()))?;
    debug!(path = %path.display(), "cluster store ready");
    Ok(store)
}

pub fn snapshot_service(config: &SimConfig, store: &ClusterStore) -> SnapshotService {
    let scheduler = Arc::new(store.scheduler(config.scheduler.external));
    let ports = Ports::from_backend(Arc::new(store.clone()), scheduler);
    SnapshotService::new(ports).with_max_concurrency(config.snapshot.max_concurrency)
}

/// Options from the config file, with flags only ever turning leniency on.
pub fn options(config: &SimConfig, ignore_errors: bool, ignore_scheduler_config: bool) -> Options {
    let base = Options::from(&config.snapshot);
    base.with_ignore_errors(base.ignore_errors || ignore_errors)
        .with_ignore_scheduler_config(base.ignore_scheduler_config || ignore_scheduler_config)
}
