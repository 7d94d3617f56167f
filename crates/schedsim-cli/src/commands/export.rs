use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use schedsim_core::SimConfig;

use super::{open_store, options, snapshot_service};

pub async fn run(
    config: &SimConfig,
    output: Option<&Path>,
    ignore_errors: bool,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let service = snapshot_service(config, &store);
    let snapshot = service
        .export(options(config, ignore_errors, false))
        .await
        .context("export failed")?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), objects = snapshot.object_count(), "snapshot written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
