//! Snapshot orchestrator error types.

use thiserror::Error;

use schedsim_core::{PortError, ResourceKind};

use crate::import::Phase;

/// Errors that abort a snapshot operation.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("list {kind}: {source}")]
    List {
        kind: ResourceKind,
        #[source]
        source: PortError,
    },

    #[error("apply {kind} {name}: {source}")]
    Apply {
        kind: ResourceKind,
        name: String,
        #[source]
        source: PortError,
    },

    #[error("delete {kind} {name}: {source}")]
    Delete {
        kind: ResourceKind,
        name: String,
        #[source]
        source: PortError,
    },

    #[error("get scheduler config: {0}")]
    SchedulerConfig(#[source] PortError),

    #[error("restart scheduler: {0}")]
    RestartScheduler(#[source] PortError),

    #[error("import {phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<SnapshotError>,
    },

    #[error("reset {phase}: {source}")]
    Reset {
        phase: Phase,
        #[source]
        source: Box<SnapshotError>,
    },

    /// A task could not be scheduled or did not run to completion.
    #[error("dispatch task: {0}")]
    Dispatch(String),
}

impl SnapshotError {
    pub(crate) fn in_phase(self, phase: Phase) -> Self {
        SnapshotError::Phase {
            phase,
            source: Box::new(self),
        }
    }

    pub(crate) fn in_reset_phase(self, phase: Phase) -> Self {
        SnapshotError::Reset {
            phase,
            source: Box::new(self),
        }
    }

    /// The port error at the root of this failure, if any.
    pub fn port_error(&self) -> Option<&PortError> {
        match self {
            SnapshotError::List { source, .. }
            | SnapshotError::Apply { source, .. }
            | SnapshotError::Delete { source, .. } => Some(source),
            SnapshotError::SchedulerConfig(e) | SnapshotError::RestartScheduler(e) => Some(e),
            SnapshotError::Phase { source, .. } | SnapshotError::Reset { source, .. } => {
                source.port_error()
            }
            SnapshotError::Dispatch(_) => None,
        }
    }
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
