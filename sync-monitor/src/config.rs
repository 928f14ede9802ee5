//! Configuration management for the sync monitor.

use std::time::Duration;

use crate::monitor::StuckRule;
use crate::network::RetryPolicy;

/// Default number of samples kept per node.
pub const DEFAULT_WINDOW_SIZE: usize = 3;

/// Default pause between polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default timeout for a single height query.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between the end of one round and the start of the next.
    pub poll_interval: Duration,

    /// Number of samples a node's window must hold before it is classified.
    pub window_size: usize,

    /// Rule deciding when a full window means the node is stuck.
    pub stuck_rule: StuckRule,

    /// Retry behavior for failed height queries.
    pub retry: RetryPolicy,

    /// Timeout applied to each individual height query.
    pub request_timeout: Duration,

    /// Poll candidate nodes concurrently within a round.
    pub concurrent_polling: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            window_size: DEFAULT_WINDOW_SIZE,
            stuck_rule: StuckRule::default(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            concurrent_polling: false,
        }
    }
}

impl MonitorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause between rounds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the window capacity.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the stuck rule.
    pub fn with_stuck_rule(mut self, rule: StuckRule) -> Self {
        self.stuck_rule = rule;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Treat the first failed height query as fatal.
    pub fn fail_fast(mut self) -> Self {
        self.retry = RetryPolicy::fail_fast();
        self
    }

    /// Set the per-query timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable concurrent polling.
    pub fn with_concurrent_polling(mut self, enabled: bool) -> Self {
        self.concurrent_polling = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window_size must be > 0".to_string());
        }

        if self.retry.max_attempts == 0 {
            return Err("retry max_attempts must be > 0".to_string());
        }

        if self.retry.base_delay > self.retry.max_delay {
            return Err("retry base_delay must not exceed max_delay".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.window_size, 3);
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.stuck_rule, StuckRule::Literal);
        assert!(!config.concurrent_polling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = MonitorConfig::new()
            .with_poll_interval(Duration::from_secs(2))
            .with_window_size(5)
            .with_stuck_rule(StuckRule::NonIncreasing)
            .with_request_timeout(Duration::from_secs(1))
            .with_concurrent_polling(true)
            .fail_fast();

        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.window_size, 5);
        assert_eq!(config.stuck_rule, StuckRule::NonIncreasing);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert!(config.concurrent_polling);
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(MonitorConfig::new().with_window_size(0).validate().is_err());
        assert!(MonitorConfig::new().with_request_timeout(Duration::ZERO).validate().is_err());

        let no_attempts = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(MonitorConfig::new().with_retry_policy(no_attempts).validate().is_err());

        let inverted = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(1),
        };
        assert!(MonitorConfig::new().with_retry_policy(inverted).validate().is_err());
    }

    #[test]
    fn test_zero_interval_is_allowed() {
        let config = MonitorConfig::new().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
