//! Errors returned across port boundaries.

use thiserror::Error;

pub type PortResult<T> = Result<T, PortError>;

/// Failure of a call into a backing store or the scheduler control plane.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The scheduler is managed externally; configuration calls are refused.
    #[error("scheduler service is disabled")]
    Disabled,

    #[error("backend error: {0}")]
    Backend(String),
}

impl PortError {
    pub fn is_disabled(&self) -> bool {
        matches!(self, PortError::Disabled)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound(_))
    }
}
