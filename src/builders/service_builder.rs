//! Construct timer services from validated configuration.

use crate::config::TimerServiceConfig;
use crate::core::{TimerError, TimerService};

/// Build a timer service from the given configuration.
///
/// # Errors
///
/// Returns `TimerError::InvalidConfig` if validation fails, or any
/// construction error from [`TimerService::with_config`].
pub fn build_service(cfg: &TimerServiceConfig) -> Result<TimerService, TimerError> {
    TimerService::with_config(cfg.clone())
}

/// Parse a JSON configuration string and build a timer service from it.
///
/// # Errors
///
/// Returns `TimerError::InvalidConfig` for parse or validation failures,
/// or any construction error from [`TimerService::with_config`].
pub fn build_service_from_json(input: &str) -> Result<TimerService, TimerError> {
    let cfg = TimerServiceConfig::from_json_str(input).map_err(TimerError::InvalidConfig)?;
    TimerService::with_config(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_service_from_config() {
        let cfg = TimerServiceConfig::new().with_max_timers(4);
        let service = build_service(&cfg).unwrap();
        service.close().unwrap();
    }

    #[test]
    fn test_build_service_rejects_invalid_config() {
        let cfg = TimerServiceConfig::new().with_max_timers(0);
        assert!(matches!(
            build_service(&cfg),
            Err(TimerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_service_from_json_rejects_garbage() {
        assert!(matches!(
            build_service_from_json("not json"),
            Err(TimerError::InvalidConfig(_))
        ));
    }
}
