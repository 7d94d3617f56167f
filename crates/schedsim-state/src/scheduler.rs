//! SchedulerStore — the simulated scheduler's control surface.
//!
//! Persists the active scheduler configuration next to the cluster objects.
//! When the simulator runs against an external scheduler the store is
//! created with `external = true` and refuses every configuration call with
//! `PortError::Disabled`.

use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::{debug, info};

use schedsim_core::{PortError, PortResult, SchedulerConfig, SchedulerControl};

use crate::error::{StateError, StateResult};
use crate::store::map_err;
use crate::tables::{ACTIVE_SCHEDULER_CONFIG, SCHEDULER};

#[derive(Clone)]
pub struct SchedulerStore {
    db: Arc<Database>,
    external: bool,
}

impl SchedulerStore {
    pub(crate) fn new(db: Arc<Database>, external: bool) -> Self {
        Self { db, external }
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    /// The stored configuration, or the default one if none was ever set.
    pub fn active_config(&self) -> StateResult<SchedulerConfig> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCHEDULER).map_err(map_err!(Table))?;
        match table.get(ACTIVE_SCHEDULER_CONFIG).map_err(map_err!(Read))? {
            Some(guard) => {
                serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))
            }
            None => Ok(SchedulerConfig::default()),
        }
    }

    /// Replace the stored configuration.
    pub fn set_active_config(&self, config: &SchedulerConfig) -> StateResult<()> {
        let value = serde_json::to_vec(config).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SCHEDULER).map_err(map_err!(Table))?;
            table
                .insert(ACTIVE_SCHEDULER_CONFIG, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(extenders = config.extenders.len(), "scheduler config stored");
        Ok(())
    }
}

#[async_trait]
impl SchedulerControl for SchedulerStore {
    async fn get_config(&self) -> PortResult<SchedulerConfig> {
        if self.external {
            return Err(PortError::Disabled);
        }
        Ok(self.active_config()?)
    }

    async fn restart(&self, config: Option<SchedulerConfig>) -> PortResult<()> {
        if self.external {
            return Err(PortError::Disabled);
        }
        let config = config.unwrap_or_default();
        self.set_active_config(&config)?;
        info!(
            profiles = config.profiles.len(),
            extenders = config.extenders.len(),
            "scheduler restarted"
        );
        Ok(())
    }
}
