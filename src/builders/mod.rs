//! Builders to construct timer services from configuration.

pub mod service_builder;

pub use service_builder::{build_service, build_service_from_json};
