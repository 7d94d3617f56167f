use std::path::Path;

use anyhow::Context;
use tracing::info;

use schedsim_core::SimConfig;
use schedsim_snapshot::ImportSnapshot;

use super::{open_store, options, snapshot_service};

pub async fn run(
    config: &SimConfig,
    input: &Path,
    ignore_errors: bool,
    ignore_scheduler_config: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let snapshot: ImportSnapshot = serde_json::from_slice(&content)
        .with_context(|| format!("{} is not a snapshot", input.display()))?;
    let objects = snapshot.object_count();

    let store = open_store(config)?;
    let service = snapshot_service(config, &store);
    service
        .import(snapshot, options(config, ignore_errors, ignore_scheduler_config))
        .await
        .context("import failed")?;

    info!(path = %input.display(), objects, "snapshot imported");
    Ok(())
}
