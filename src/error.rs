//! Error types
//!
//! License: MIT
//! Author: Moroya Sakamoto

use alloc::string::String;

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, LocomotionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocomotionError {
    /// A solver call received data it cannot weight
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Rejected while building a simulation component; not retried
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// TOML configuration could not be decoded
    #[cfg(feature = "config")]
    #[error("config parse error: {0}")]
    Parse(String),
}

impl LocomotionError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!(reason = %msg, "configuration rejected");
        Self::InvalidConfiguration(msg)
    }
}
