//! Per-call export/import options.

use schedsim_core::config::SnapshotConfig;

/// Flags threaded through one export or import call.
///
/// The default is strict: the first failing sub-operation aborts the call
/// and the scheduler is restarted with the imported configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Log sub-operation failures and continue with safe defaults.
    pub ignore_errors: bool,
    /// Import only: leave the running scheduler untouched.
    pub ignore_scheduler_config: bool,
}

impl Options {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            ignore_errors: true,
            ..Self::default()
        }
    }

    pub fn with_ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    pub fn with_ignore_scheduler_config(mut self, ignore: bool) -> Self {
        self.ignore_scheduler_config = ignore;
        self
    }
}

impl From<&SnapshotConfig> for Options {
    fn from(config: &SnapshotConfig) -> Self {
        Self {
            ignore_errors: config.ignore_errors,
            ignore_scheduler_config: config.ignore_scheduler_config,
        }
    }
}
