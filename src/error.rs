use std::io;

use thiserror::Error;

use crate::session::SessionState;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Host list could not be expanded, or expanded to 0 or too many hosts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A lifecycle call was made from a state that does not allow it.
    /// Nothing changes when this is returned.
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("export failed: {0}")]
    Export(#[from] io::Error),

    #[error("csv formatting failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl MonitorError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        MonitorError::InvalidInput(message.into())
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, MonitorError::InvalidTransition { .. })
    }
}
