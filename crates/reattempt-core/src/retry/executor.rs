//! Retry execution engine
//!
//! This module provides the core retry loop: run the operation, classify any
//! failure, consult the stopping policy and either surface the outcome or
//! prepare for another attempt.
//!
//! Execution is synchronous. The operation, the recovery target and the delay
//! all run on the calling thread, and an attempt in flight is never
//! interrupted. The deadline is only checked between attempts.

use std::fmt::Display;
use std::time::{Duration, Instant};

use crate::types::{RetryPolicy, StoppingPolicy};

use super::classifier::{AlwaysRetry, FailureClassifier};
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::reload::Reloadable;

/// Execute an operation with the default policy (two attempts, no delay)
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::retry;
///
/// let mut calls = 0;
/// let value = retry(|| {
///     calls += 1;
///     if calls < 2 {
///         Err("transient")
///     } else {
///         Ok(42)
///     }
/// })
/// .unwrap();
///
/// assert_eq!(value, 42);
/// assert_eq!(calls, 2);
/// ```
pub fn retry<F, T, E>(op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    retry_with_policy(&RetryPolicy::default(), op)
}

/// Execute an operation with retry logic based on a policy
///
/// Every failure is retryable. For a narrower classifier, a recovery target
/// or an observer, use `RetryExecutorBuilder`.
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::retry_with_policy;
/// use reattempt_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::attempts(3);
/// let result: Result<(), _> = retry_with_policy(&policy, || Err("always fails"));
///
/// let err = result.unwrap_err();
/// assert!(err.is_exhausted());
/// assert_eq!(err.attempts(), 3);
/// ```
pub fn retry_with_policy<F, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .build()
        .execute(op)
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::{AlwaysRetry, RetryExecutorBuilder, TracingObserver};
/// use reattempt_core::types::RetryPolicy;
/// use std::time::Duration;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::deadline(Duration::from_secs(2)).with_delay(Duration::from_millis(100)))
///     .with_classifier(AlwaysRetry)
///     .with_observer(TracingObserver::new("user-sync"))
///     .build();
///
/// let value: Result<u32, _> = executor.execute(|| Ok::<_, std::io::Error>(7));
/// assert_eq!(value.unwrap(), 7);
/// ```
pub struct RetryExecutorBuilder<'r, C = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    classifier: C,
    observer: O,
    reload_target: Option<&'r dyn Reloadable>,
}

impl Default for RetryExecutorBuilder<'_, AlwaysRetry, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> RetryExecutorBuilder<'r, AlwaysRetry, NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            classifier: AlwaysRetry,
            observer: NoOpObserver,
            reload_target: None,
        }
    }
}

impl<'r, C, O> RetryExecutorBuilder<'r, C, O> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound the sequence to `max_attempts` attempts in total
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.stopping = StoppingPolicy::Attempts(max_attempts);
        self
    }

    /// Keep retrying until `timeout` has passed since the first attempt started
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.policy.stopping = StoppingPolicy::Deadline(timeout);
        self
    }

    /// Wait this long before every retry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.policy.delay = Some(delay);
        self
    }

    /// Set the failure classifier
    ///
    /// The classifier determines whether a failure should be retried.
    pub fn with_classifier<C2>(self, classifier: C2) -> RetryExecutorBuilder<'r, C2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            classifier,
            observer: self.observer,
            reload_target: self.reload_target,
        }
    }

    /// Set the observer
    ///
    /// The observer receives callbacks during retry execution.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<'r, C, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            classifier: self.classifier,
            observer,
            reload_target: self.reload_target,
        }
    }

    /// Set the recovery target reloaded before every retry
    pub fn with_reload_target(mut self, target: &'r dyn Reloadable) -> Self {
        self.reload_target = Some(target);
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<'r, C, O> {
        RetryExecutor {
            policy: self.policy,
            classifier: self.classifier,
            observer: self.observer,
            reload_target: self.reload_target,
        }
    }
}

/// A retry executor with configurable policy, classifier, recovery target and observer
///
/// Use `RetryExecutorBuilder` to create an instance. An executor holds no
/// state between calls and may run any number of operations.
pub struct RetryExecutor<'r, C, O> {
    policy: RetryPolicy,
    classifier: C,
    observer: O,
    reload_target: Option<&'r dyn Reloadable>,
}

/// Stopping policy resolved against the start of a call
#[derive(Debug, Clone, Copy)]
enum Budget {
    Attempts(u32),
    /// `None` when the deadline lies beyond what the clock can represent
    Deadline {
        timeout: Duration,
        at: Option<Instant>,
    },
}

impl Budget {
    fn start(stopping: StoppingPolicy, start: Instant) -> Self {
        match stopping {
            // The operation always runs at least once.
            StoppingPolicy::Attempts(max) => Budget::Attempts(max.max(1)),
            StoppingPolicy::Deadline(timeout) => Budget::Deadline {
                timeout,
                at: start.checked_add(timeout),
            },
        }
    }
}

impl<C, O> RetryExecutor<'_, C, O>
where
    O: RetryObserver,
{
    /// The policy this executor applies
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// # Arguments
    ///
    /// * `op` - The operation; return `Ok(())` for operations without a value
    ///
    /// # Returns
    ///
    /// The value of the first successful attempt, or a `RetryError` carrying
    /// the failure that ended the sequence.
    pub fn execute<F, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
        C: FailureClassifier<E>,
    {
        let start = Instant::now();
        let budget = Budget::start(self.policy.stopping, start);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            self.observer.on_attempt_start(attempt);

            let err = match op() {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.classifier.is_retryable(&err) {
                self.observer.on_not_retryable(attempt, &err);
                return Err(RetryError::non_retryable(attempt, err));
            }

            match budget {
                Budget::Attempts(max) if attempt >= max => {
                    self.observer.on_exhausted(attempt, &err);
                    return Err(RetryError::exhausted(attempt, err, start.elapsed()));
                }
                Budget::Deadline {
                    timeout,
                    at: Some(deadline),
                } if Instant::now() > deadline => {
                    self.observer.on_exhausted(attempt, &err);
                    return Err(RetryError::deadline_elapsed(
                        attempt,
                        err,
                        timeout,
                        start.elapsed(),
                    ));
                }
                _ => {}
            }

            self.prepare(attempt, &err)?;
        }
    }

    /// Run the steps between a retryable failure and the next attempt
    fn prepare<E>(&self, attempt: u32, err: &E) -> Result<(), RetryError<E>>
    where
        E: Display,
        C: FailureClassifier<E>,
    {
        let category = self.classifier.category_label(err);
        self.observer.on_retry_triggered(attempt, &category, err);

        if let Some(target) = self.reload_target {
            let name = target.target_name();
            self.observer.on_reload(attempt, name);

            if let Err(source) = target.reload() {
                self.observer.on_reload_failed(attempt, name, &source);
                return Err(RetryError::reload_failed(attempt, name, source));
            }
        }

        let delay = self.policy.delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
            self.observer.on_delay(attempt, delay);
        }

        self.observer.on_retrying(attempt.saturating_add(1));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::classifier::ClosureClassifier;
    use crate::retry::observer::StatsObserver;
    use std::cell::Cell;
    use std::io;
    use std::sync::Arc;

    fn test_policy() -> RetryPolicy {
        RetryPolicy::attempts(3).with_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_immediate_success() {
        let observer = Arc::new(StatsObserver::new());

        let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .build()
            .execute(|| Ok("success"));

        assert_eq!(result.unwrap(), "success");
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.retries_triggered(), 0);
    }

    #[test]
    fn test_success_after_retry() {
        let observer = Arc::new(StatsObserver::new());
        let attempts = Cell::new(0);

        let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .build()
            .execute(|| {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 2 {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
                } else {
                    Ok("success")
                }
            });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(observer.attempt_starts(), 2);
        assert_eq!(observer.retries_triggered(), 1);
        assert_eq!(observer.delays(), 1);
        assert_eq!(observer.retries(), 1);
        assert_eq!(observer.successes(), 1);
    }

    #[test]
    fn test_all_attempts_exhausted() {
        let observer = Arc::new(StatsObserver::new());

        let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .build()
            .execute(|| Err(io::Error::new(io::ErrorKind::TimedOut, "always fails")));

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 3);
        assert_eq!(observer.attempt_starts(), 3);
        assert_eq!(observer.retries_triggered(), 2);
        assert_eq!(observer.exhaustions(), 1);
    }

    #[test]
    fn test_non_retryable_error() {
        let observer = Arc::new(StatsObserver::new());

        let classifier =
            ClosureClassifier::new(|err: &io::Error| err.kind() != io::ErrorKind::NotFound);

        let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_classifier(classifier)
            .with_observer(observer.clone())
            .build()
            .execute(|| Err(io::Error::new(io::ErrorKind::NotFound, "not found")));

        let err = result.unwrap_err();
        assert!(err.is_non_retryable());
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.rejections(), 1);
        assert_eq!(observer.delays(), 0);
    }

    #[test]
    fn test_retry_convenience_defaults_to_two_attempts() {
        let attempts = Cell::new(0);

        let result: Result<(), RetryError<&str>> = retry(|| {
            attempts.set(attempts.get() + 1);
            Err("error")
        });

        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_zero_max_attempts_still_runs_once() {
        let attempts = Cell::new(0);
        let policy = RetryPolicy::attempts(0);

        let result: Result<(), RetryError<&str>> = retry_with_policy(&policy, || {
            attempts.set(attempts.get() + 1);
            Err("error")
        });

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 1);
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_single_attempt() {
        let observer = Arc::new(StatsObserver::new());

        let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
            .with_max_attempts(1)
            .with_observer(observer.clone())
            .build()
            .execute(|| Err(io::Error::other("error")));

        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.exhaustions(), 1);
        assert_eq!(observer.retries_triggered(), 0);
    }

    #[test]
    fn test_huge_timeout_never_elapses() {
        let attempts = Cell::new(0);

        let result: Result<u32, RetryError<&str>> = RetryExecutorBuilder::new()
            .with_timeout(Duration::MAX)
            .build()
            .execute(|| {
                attempts.set(attempts.get() + 1);
                if attempts.get() < 5 {
                    Err("not yet")
                } else {
                    Ok(attempts.get())
                }
            });

        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn test_builder_overrides_policy_fields() {
        let executor = RetryExecutorBuilder::new()
            .with_policy(RetryPolicy::attempts(4))
            .with_timeout(Duration::from_millis(250))
            .with_delay(Duration::from_millis(5))
            .build();

        assert_eq!(executor.policy().timeout(), Some(Duration::from_millis(250)));
        assert_eq!(executor.policy().max_attempts(), None);
        assert_eq!(executor.policy().delay(), Duration::from_millis(5));
    }
}
