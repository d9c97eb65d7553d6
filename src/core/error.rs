//! Error types for timer service operations.

use thiserror::Error;

use super::service::ServiceState;

/// Errors produced by the timer service.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Registration period must be strictly positive.
    #[error("invalid period: must be greater than zero")]
    InvalidPeriod,
    /// Operation is not valid in the service's current state.
    #[error("invalid state: service is {0}")]
    InvalidState(ServiceState),
    /// The OS or the service refused to allocate another resource.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
    /// The dispatch loop's wait primitive failed.
    #[error("wait failed: {0}")]
    WaitFailed(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
