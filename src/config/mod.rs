//! Configuration models for the timer service.

pub mod service;

pub use service::TimerServiceConfig;
