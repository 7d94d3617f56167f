use anyhow::Context;
use tracing::info;

use schedsim_core::SimConfig;

use super::{open_store, options, snapshot_service};

pub async fn run(config: &SimConfig, ignore_errors: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    snapshot_service(config, &store)
        .reset(options(config, ignore_errors, false))
        .await
        .context("reset failed")?;
    info!(data_dir = %config.store.data_dir.display(), "cluster store reset");
    Ok(())
}
