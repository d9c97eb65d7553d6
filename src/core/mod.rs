//! Core timer scheduling: the service, its dispatch loop, and wake sources.

pub mod error;
pub mod service;

mod dispatch;
mod source;

pub use error::{AppResult, TimerError};
pub use service::{ServiceState, ServiceStats, TimerService};
