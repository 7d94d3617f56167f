//! Error types for the schedsim cluster store.

use thiserror::Error;

use schedsim_core::PortError;

/// Result type alias for cluster store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during cluster store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("invalid object: {0}")]
    Invalid(String),

    /// Apply carried a uid; identities are assigned by the store.
    #[error("uid must not be set on apply: {0}")]
    UidConflict(String),
}

impl From<StateError> for PortError {
    fn from(e: StateError) -> Self {
        PortError::Backend(e.to_string())
    }
}
