//! Timer service configuration structures.

use serde::{Deserialize, Serialize};

/// Configuration for a [`TimerService`](crate::core::TimerService).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerServiceConfig {
    /// Maximum number of registered timers before registration is refused.
    pub max_timers: usize,
    /// Capacity of the control channel between callers and the dispatch
    /// loop. Registrations beyond this depth are refused, not queued.
    pub control_queue_depth: usize,
    /// Name assigned to the dispatch thread.
    pub thread_name: String,
    /// Stack size of the dispatch thread, in bytes. Callbacks run on this
    /// stack.
    pub thread_stack_size: usize,
}

impl Default for TimerServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerServiceConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_timers: 1024,
            control_queue_depth: 64,
            thread_name: "timer-dispatch".to_string(),
            thread_stack_size: 2 * 1024 * 1024,
        }
    }

    /// Set the maximum number of registered timers.
    #[must_use]
    pub fn with_max_timers(mut self, max_timers: usize) -> Self {
        self.max_timers = max_timers;
        self
    }

    /// Set the control channel capacity.
    #[must_use]
    pub fn with_control_queue_depth(mut self, depth: usize) -> Self {
        self.control_queue_depth = depth;
        self
    }

    /// Set the dispatch thread's name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the dispatch thread's stack size in bytes.
    #[must_use]
    pub fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_timers == 0 {
            return Err("max_timers must be greater than 0".into());
        }
        if self.control_queue_depth == 0 {
            return Err("control_queue_depth must be greater than 0".into());
        }
        if self.thread_name.is_empty() {
            return Err("thread_name must not be empty".into());
        }
        if self.thread_stack_size == 0 {
            return Err("thread_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a configuration from a JSON string and validate.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TimerServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_timers() {
        let cfg = TimerServiceConfig::new().with_max_timers(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_control_queue_depth() {
        let cfg = TimerServiceConfig::new().with_control_queue_depth(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_thread_name() {
        let cfg = TimerServiceConfig::new().with_thread_name("");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_thread_stack_size() {
        let cfg = TimerServiceConfig::new().with_thread_stack_size(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_builder_round_trip() {
        let cfg = TimerServiceConfig::new()
            .with_max_timers(8)
            .with_control_queue_depth(4)
            .with_thread_name("test-dispatch")
            .with_thread_stack_size(256 * 1024);
        assert_eq!(cfg.max_timers, 8);
        assert_eq!(cfg.control_queue_depth, 4);
        assert_eq!(cfg.thread_name, "test-dispatch");
        assert_eq!(cfg.thread_stack_size, 256 * 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_str() {
        let cfg = TimerServiceConfig::from_json_str(
            r#"{"max_timers": 16, "control_queue_depth": 8, "thread_name": "ticker", "thread_stack_size": 131072}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_timers, 16);
        assert_eq!(cfg.thread_name, "ticker");
    }

    #[test]
    fn test_from_json_str_defaults_missing_fields() {
        let cfg = TimerServiceConfig::from_json_str(r#"{"max_timers": 2}"#).unwrap();
        assert_eq!(cfg.max_timers, 2);
        assert_eq!(cfg.control_queue_depth, 64);
    }

    #[test]
    fn test_from_json_str_rejects_invalid() {
        assert!(TimerServiceConfig::from_json_str(r#"{"max_timers": 0}"#).is_err());
        assert!(TimerServiceConfig::from_json_str("not json").is_err());
    }
}
