//! Bounded retry with exponential backoff for height queries.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ConnectivityResult;
use crate::event_bus::EventBus;
use crate::events::MonitorEvent;
use crate::network::HeightSource;
use crate::types::Endpoint;

/// How often and how patiently failed height queries are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per query, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt: the first failure is returned to the caller.
    pub fn fail_fast() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after `failed_attempts` consecutive failures.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        2_u32
            .checked_pow(failed_attempts.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Wraps a height source and retries transient failures per a [`RetryPolicy`].
pub struct RetryingHeightSource<S> {
    inner: S,
    policy: RetryPolicy,
    events: EventBus<MonitorEvent>,
}

impl<S: HeightSource> RetryingHeightSource<S> {
    /// Wrap `inner`, announcing each scheduled retry on `events`.
    pub fn new(inner: S, policy: RetryPolicy, events: EventBus<MonitorEvent>) -> Self {
        Self {
            inner,
            policy,
            events,
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: HeightSource> HeightSource for RetryingHeightSource<S> {
    async fn height(&self, endpoint: &Endpoint) -> ConnectivityResult<u64> {
        let mut attempt = 1;
        loop {
            let err = match self.inner.height(endpoint).await {
                Ok(height) => return Ok(height),
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.policy.max_attempts {
                if attempt > 1 {
                    tracing::error!(
                        "Height query to {} failed after {} attempts: {}",
                        endpoint,
                        attempt,
                        err
                    );
                }
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "Height query to {} failed (attempt {}/{}): {}; retrying in {}ms",
                endpoint,
                attempt,
                self.policy.max_attempts,
                err,
                delay.as_millis()
            );
            self.events.emit(&[MonitorEvent::RetryScheduled {
                endpoint: endpoint.clone(),
                attempt,
                delay,
                error: err.to_string(),
            }]);

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
