use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use schedsim_core::SimConfig;
use schedsim_snapshot::Ports;

use super::{STORE_FILE, open_store, open_store_at, options, snapshot_service};

/// Copy the cluster kept in `from` into the configured store.
pub async fn run(
    config: &SimConfig,
    from: &Path,
    ignore_errors: bool,
    ignore_scheduler_config: bool,
) -> anyhow::Result<()> {
    if !from.join(STORE_FILE).exists() {
        anyhow::bail!("no cluster store in {}", from.display());
    }
    let source = open_store_at(from)?;
    let source_ports =
        Ports::from_backend(Arc::new(source.clone()), Arc::new(source.scheduler(false)));

    let store = open_store(config)?;
    snapshot_service(config, &store)
        .replicate(
            source_ports,
            options(config, ignore_errors, ignore_scheduler_config),
        )
        .await
        .context("replicate failed")?;

    info!(from = %from.display(), "cluster replicated");
    Ok(())
}
