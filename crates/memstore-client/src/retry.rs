//! # Retry Module
//!
//! Implements bounded retry logic for transient store failures.
//!
//! Every client operation runs through a [`RetryExecutor`]: the initial
//! attempt plus up to `max_retries` re-invocations, after which the final
//! error is propagated to the caller. Intermediate failures are logged,
//! never surfaced. The default policy retries immediately; exponential
//! backoff with jitter is available as a configuration point.

use crate::error::StoreError;
use rand::RngExt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Default retry budget applied when callers do not override it
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry policy configuration
///
/// # Examples
///
/// ```rust
/// use memstore_client::retry::RetryPolicy;
/// use std::time::Duration;
///
/// // Default policy: 3 immediate retries
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.total_attempts(), 4);
///
/// // Exponential backoff: 5 retries, 100ms initial, 10s cap, 2.0x multiplier
/// let policy = RetryPolicy::exponential(
///     5,
///     Duration::from_millis(100),
///     Duration::from_secs(10),
///     2.0,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial one
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Exponential backoff multiplier (typically 2.0)
    pub backoff_multiplier: f64,

    /// Whether to add jitter to delays
    pub use_jitter: bool,

    /// Jitter range as percentage (default 25% = ±25%)
    pub jitter_percent: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Create a policy that retries without delay
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum retry attempts after the initial one
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            use_jitter: false,
            jitter_percent: 0.0,
        }
    }

    /// Create a policy with exponential backoff between retries
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Maximum retry attempts after the initial one
    /// * `initial_delay` - Delay before the first retry
    /// * `max_delay` - Maximum delay cap
    /// * `backoff_multiplier` - Exponential growth factor (typically 1.5-2.0)
    pub fn exponential(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            backoff_multiplier,
            use_jitter: true,
            jitter_percent: 0.25,
        }
    }

    /// Disable jitter
    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Set custom jitter percentage (0.0 to 1.0)
    pub fn with_jitter_percent(mut self, percent: f64) -> Self {
        self.jitter_percent = percent.clamp(0.0, 1.0);
        self
    }

    /// Calculate delay for a specific retry attempt
    ///
    /// Uses exponential backoff formula: delay = initial * multiplier^attempt,
    /// capped at `max_delay`, with jitter applied if enabled.
    ///
    /// # Arguments
    ///
    /// * `attempt` - Retry attempt number (0-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        // Calculate base delay: initial * multiplier^attempt
        let base_delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);

        // Cap at max_delay
        let capped_delay_secs = base_delay_secs.min(self.max_delay.as_secs_f64());

        // Add jitter if enabled
        let final_delay_secs = if self.use_jitter {
            Self::add_jitter(capped_delay_secs, self.jitter_percent)
        } else {
            capped_delay_secs
        };

        Duration::from_secs_f64(final_delay_secs)
    }

    /// Check if we should retry for this attempt number
    ///
    /// # Arguments
    ///
    /// * `attempt` - Current retry attempt number (0-based)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Add jitter to a delay value
    ///
    /// Applies random variation in range [delay * (1-jitter), delay * (1+jitter)]
    fn add_jitter(delay_secs: f64, jitter_percent: f64) -> f64 {
        let mut rng = rand::rng();

        // Calculate jitter range: ±jitter_percent of delay
        let jitter_range = delay_secs * jitter_percent;

        // Generate random value in range [-jitter_range, +jitter_range]
        let jitter = rng.random_range(-jitter_range..=jitter_range);

        // Apply jitter, ensuring result is positive
        (delay_secs + jitter).max(0.0)
    }

    /// Get total number of invocations (initial + retries)
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1 // Initial attempt + retries
    }
}

/// State tracker for retry operations
///
/// Tracks current attempt number and provides helper methods for retry logic.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Current retry attempt (0-based)
    pub attempt: u32,

    /// Total invocations made so far (including initial)
    pub total_attempts: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    /// Create new retry state starting at attempt 0
    pub fn new() -> Self {
        Self {
            attempt: 0,
            total_attempts: 1, // Started with initial attempt
        }
    }

    /// Increment to next retry attempt
    pub fn next_attempt(&mut self) {
        self.attempt += 1;
        self.total_attempts += 1;
    }

    /// Check if no retry has happened yet
    pub fn is_first_retry(&self) -> bool {
        self.attempt == 0
    }

    /// Get next delay from policy
    pub fn get_delay(&self, policy: &RetryPolicy) -> Duration {
        policy.calculate_delay(self.attempt)
    }

    /// Check if we can retry with this policy
    pub fn can_retry(&self, policy: &RetryPolicy) -> bool {
        policy.should_retry(self.attempt)
    }
}

/// Runs store operations with bounded retries
///
/// Only transient failures consume retry budget; permanent failures
/// propagate on the first attempt. When the budget is exhausted the
/// final error is returned unchanged.
///
/// # Examples
///
/// ```rust
/// use memstore_client::error::StoreError;
/// use memstore_client::retry::{RetryExecutor, RetryPolicy};
///
/// # tokio_test::block_on(async {
/// let executor = RetryExecutor::new(RetryPolicy::default());
/// let result: Result<u32, StoreError> = executor.run("demo", || async { Ok(42) }).await;
/// assert_eq!(result.unwrap(), 42);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Get the configured policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run an operation until it succeeds or the retry budget is spent
    ///
    /// # Arguments
    ///
    /// * `operation` - Short name used in log records
    /// * `attempt_fn` - Closure producing one invocation of the operation
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt_fn: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut state = RetryState::new();

        loop {
            match attempt_fn().await {
                Ok(value) => {
                    if !state.is_first_retry() {
                        debug!(
                            operation,
                            total_attempts = state.total_attempts,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) if error.should_retry() && state.can_retry(&self.policy) => {
                    let delay = state.get_delay(&self.policy);

                    debug!(
                        operation,
                        error = %error,
                        attempt = state.total_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient store failure, retrying"
                    );

                    // Immediate policies skip the timer entirely
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }

                    state.next_attempt();
                }
                Err(error) => {
                    if error.should_retry() {
                        warn!(
                            operation,
                            error = %error,
                            total_attempts = state.total_attempts,
                            "Retry budget exhausted"
                        );
                    } else {
                        warn!(
                            operation,
                            error = %error,
                            "Permanent store failure, not retrying"
                        );
                    }
                    return Err(error);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
