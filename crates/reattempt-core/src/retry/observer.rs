//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.
//!
//! Observer callbacks return nothing, so an observer can never change whether
//! an operation is retried or which failure reaches the caller.

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for retry events
///
/// Every retry emits, in order: `on_retry_triggered`, `on_reload` (only with
/// a recovery target), `on_delay` (only with a positive delay) and
/// `on_retrying`.
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::RetryObserver;
/// use std::fmt::Display;
///
/// struct PrintObserver;
///
/// impl RetryObserver for PrintObserver {
///     fn on_retry_triggered(&self, attempt: u32, category: &str, error: &dyn Display) {
///         eprintln!("attempt {attempt} failed with {category}: {error}");
///     }
///
///     fn on_retrying(&self, attempt: u32) {
///         eprintln!("starting attempt {attempt}");
///     }
/// }
/// ```
pub trait RetryObserver {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    fn on_attempt_start(&self, attempt: u32) {
        let _ = attempt;
    }

    /// Called when a retryable failure triggers a retry
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that failed (1-indexed)
    /// * `category` - Failure category, as labelled by the classifier
    /// * `error` - The failure itself
    fn on_retry_triggered(&self, attempt: u32, category: &str, error: &dyn Display);

    /// Called right before the recovery target is reloaded
    fn on_reload(&self, attempt: u32, target: &str) {
        let _ = (attempt, target);
    }

    /// Called after the calling thread has waited out the retry delay
    fn on_delay(&self, attempt: u32, delay: Duration) {
        let _ = (attempt, delay);
    }

    /// Called when the operation is about to be retried
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number about to start (1-indexed)
    fn on_retrying(&self, attempt: u32);

    /// Called when the operation succeeds
    fn on_success(&self, attempt: u32, total_duration: Duration) {
        let _ = (attempt, total_duration);
    }

    /// Called when the stopping policy forbids another attempt
    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        let _ = (attempts, error);
    }

    /// Called when the classifier rejects a failure
    fn on_not_retryable(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }

    /// Called when the recovery target fails to reload
    fn on_reload_failed(&self, attempt: u32, target: &str, error: &dyn Display) {
        let _ = (attempt, target, error);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_retry_triggered(&self, _attempt: u32, _category: &str, _error: &dyn Display) {}

    fn on_retrying(&self, _attempt: u32) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`, `on_delay`: DEBUG
/// - `on_retry_triggered`, `on_not_retryable`: WARN
/// - `on_reload`, `on_retrying`: INFO
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`, `on_reload_failed`: ERROR
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::TracingObserver;
///
/// let observer = TracingObserver::new("user-sync");
/// assert_eq!(observer.operation(), "user-sync");
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32) {
        tracing::debug!(operation = %self.operation, attempt, "starting attempt");
    }

    fn on_retry_triggered(&self, attempt: u32, category: &str, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            category,
            error = %error,
            "preparing to retry after failure"
        );
    }

    fn on_reload(&self, attempt: u32, target: &str) {
        tracing::info!(operation = %self.operation, attempt, target, "reloading instance");
    }

    fn on_delay(&self, attempt: u32, delay: Duration) {
        tracing::debug!(
            operation = %self.operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "waited before retry"
        );
    }

    fn on_retrying(&self, attempt: u32) {
        tracing::info!(operation = %self.operation, attempt, "retrying operation");
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
        tracing::error!(
            operation = %self.operation,
            attempts,
            error = %error,
            "retry policy exhausted"
        );
    }

    fn on_not_retryable(&self, attempt: u32, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            "failure is not retryable"
        );
    }

    fn on_reload_failed(&self, attempt: u32, target: &str, error: &dyn Display) {
        tracing::error!(
            operation = %self.operation,
            attempt,
            target,
            error = %error,
            "reload failed, giving up"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    /// Attempt start events
    pub attempt_starts: AtomicU32,
    /// Retry triggered events
    pub retries_triggered: AtomicU32,
    /// Reload events
    pub reloads: AtomicU32,
    /// Delay events
    pub delays: AtomicU32,
    /// Retrying events
    pub retries: AtomicU32,
    /// Success events
    pub successes: AtomicU32,
    /// Exhaustion events
    pub exhaustions: AtomicU32,
    /// Rejected failure events
    pub rejections: AtomicU32,
    /// Reload failure events
    pub reload_failures: AtomicU32,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of triggered retries
    pub fn retries_triggered(&self) -> u32 {
        self.retries_triggered.load(Ordering::SeqCst)
    }

    /// Get the number of reloads
    pub fn reloads(&self) -> u32 {
        self.reloads.load(Ordering::SeqCst)
    }

    /// Get the number of delays
    pub fn delays(&self) -> u32 {
        self.delays.load(Ordering::SeqCst)
    }

    /// Get the number of retries started
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of rejected failures
    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    /// Get the number of reload failures
    pub fn reload_failures(&self) -> u32 {
        self.reload_failures.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retry_triggered(&self, _attempt: u32, _category: &str, _error: &dyn Display) {
        self.retries_triggered.fetch_add(1, Ordering::SeqCst);
    }

    fn on_reload(&self, _attempt: u32, _target: &str) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn on_delay(&self, _attempt: u32, _delay: Duration) {
        self.delays.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retrying(&self, _attempt: u32) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &dyn Display) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_not_retryable(&self, _attempt: u32, _error: &dyn Display) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_reload_failed(&self, _attempt: u32, _target: &str, _error: &dyn Display) {
        self.reload_failures.fetch_add(1, Ordering::SeqCst);
    }
}

macro_rules! forward_observer {
    ($($wrapper:ty),+) => {$(
        impl<T: RetryObserver + ?Sized> RetryObserver for $wrapper {
            fn on_attempt_start(&self, attempt: u32) {
                (**self).on_attempt_start(attempt)
            }

            fn on_retry_triggered(&self, attempt: u32, category: &str, error: &dyn Display) {
                (**self).on_retry_triggered(attempt, category, error)
            }

            fn on_reload(&self, attempt: u32, target: &str) {
                (**self).on_reload(attempt, target)
            }

            fn on_delay(&self, attempt: u32, delay: Duration) {
                (**self).on_delay(attempt, delay)
            }

            fn on_retrying(&self, attempt: u32) {
                (**self).on_retrying(attempt)
            }

            fn on_success(&self, attempt: u32, total_duration: Duration) {
                (**self).on_success(attempt, total_duration)
            }

            fn on_exhausted(&self, attempts: u32, error: &dyn Display) {
                (**self).on_exhausted(attempts, error)
            }

            fn on_not_retryable(&self, attempt: u32, error: &dyn Display) {
                (**self).on_not_retryable(attempt, error)
            }

            fn on_reload_failed(&self, attempt: u32, target: &str, error: &dyn Display) {
                (**self).on_reload_failed(attempt, target, error)
            }
        }
    )+};
}

forward_observer!(&T, std::sync::Arc<T>, Box<T>);
