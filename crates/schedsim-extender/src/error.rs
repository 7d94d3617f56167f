//! Extender proxy error types.

use thiserror::Error;

use crate::annotation::ExtenderPhase;

#[derive(Debug, Error)]
pub enum ExtenderError {
    #[error("unknown extender: {0}")]
    Unknown(usize),

    #[error("extender {name} {phase}: {message}")]
    Client {
        name: String,
        phase: ExtenderPhase,
        message: String,
    },
}

pub type ExtenderResult<T> = Result<T, ExtenderError>;
