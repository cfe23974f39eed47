//! Terminal outcomes of a retry sequence
//!
//! Every variant that ends because of an operation failure carries that
//! failure unmodified. Earlier failures are never aggregated: only the most
//! recent relevant one is kept.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors surfaced once the executor stops retrying
///
/// The error type is generic over `E`, the failure type of the operation
/// being retried.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The classifier did not recognize the failure as retryable
    ///
    /// Returned as soon as the failure is seen; the attempt budget and the
    /// deadline are left untouched.
    NonRetryable {
        /// The attempt that produced the failure (1-indexed)
        attempt: u32,
        /// The failure raised by the operation
        source: E,
    },

    /// The count-bounded policy ran out of attempts
    Exhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The failure from the final attempt
        source: E,
        /// Total duration spent across all attempts
        total_duration: Duration,
    },

    /// The deadline-bounded policy found the deadline already passed
    DeadlineElapsed {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The failure from the final attempt
        source: E,
        /// The configured timeout
        timeout: Duration,
        /// Total duration spent across all attempts
        total_duration: Duration,
    },

    /// The recovery target failed to reload
    ///
    /// This supersedes the operation failure that triggered the retry.
    ReloadFailed {
        /// The attempt whose failure triggered the reload
        attempt: u32,
        /// Type name of the recovery target
        target: &'static str,
        /// The failure raised by the reload
        source: anyhow::Error,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::NonRetryable { attempt, source } => {
                write!(f, "non-retryable error on attempt {}: {}", attempt, source)
            }
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => {
                write!(
                    f,
                    "retry exhausted after {} attempts over {:.2}s: {}",
                    attempts,
                    total_duration.as_secs_f64(),
                    source
                )
            }
            RetryError::DeadlineElapsed {
                attempts,
                source,
                timeout,
                ..
            } => {
                write!(
                    f,
                    "retry deadline of {}ms elapsed after {} attempts: {}",
                    timeout.as_millis(),
                    attempts,
                    source
                )
            }
            RetryError::ReloadFailed {
                attempt,
                target,
                source,
            } => {
                write!(
                    f,
                    "reloading '{}' failed after attempt {}: {:#}",
                    target, attempt, source
                )
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::DeadlineElapsed { source, .. } => Some(source),
            RetryError::ReloadFailed { source, .. } => Some(&**source),
        }
    }
}

impl<E> RetryError<E> {
    /// Create a new non-retryable error
    pub fn non_retryable(attempt: u32, source: E) -> Self {
        RetryError::NonRetryable { attempt, source }
    }

    /// Create a new exhausted error
    pub fn exhausted(attempts: u32, source: E, total_duration: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_duration,
        }
    }

    /// Create a new deadline elapsed error
    pub fn deadline_elapsed(
        attempts: u32,
        source: E,
        timeout: Duration,
        total_duration: Duration,
    ) -> Self {
        RetryError::DeadlineElapsed {
            attempts,
            source,
            timeout,
            total_duration,
        }
    }

    /// Create a new reload failure error
    pub fn reload_failed(attempt: u32, target: &'static str, source: anyhow::Error) -> Self {
        RetryError::ReloadFailed {
            attempt,
            target,
            source,
        }
    }

    /// Get the number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NonRetryable { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::DeadlineElapsed { attempts, .. } => *attempts,
            RetryError::ReloadFailed { attempt, .. } => *attempt,
        }
    }

    /// Check if the classifier rejected the failure
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// Check if all attempts were exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if the deadline elapsed
    pub fn is_deadline_elapsed(&self) -> bool {
        matches!(self, RetryError::DeadlineElapsed { .. })
    }

    /// Check if the recovery target failed to reload
    pub fn is_reload_failed(&self) -> bool {
        matches!(self, RetryError::ReloadFailed { .. })
    }

    /// Get the operation failure, consuming this error
    ///
    /// Returns `None` for reload failures, which carry no operation failure.
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::DeadlineElapsed { source, .. } => Some(source),
            RetryError::ReloadFailed { .. } => None,
        }
    }

    /// Get a reference to the operation failure
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::NonRetryable { source, .. } => Some(source),
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::DeadlineElapsed { source, .. } => Some(source),
            RetryError::ReloadFailed { .. } => None,
        }
    }

    /// Get the reload failure, if the recovery target failed
    pub fn reload_error(&self) -> Option<&anyhow::Error> {
        match self {
            RetryError::ReloadFailed { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::NonRetryable { attempt, source } => RetryError::NonRetryable {
                attempt,
                source: f(source),
            },
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_duration,
            },
            RetryError::DeadlineElapsed {
                attempts,
                source,
                timeout,
                total_duration,
            } => RetryError::DeadlineElapsed {
                attempts,
                source: f(source),
                timeout,
                total_duration,
            },
            RetryError::ReloadFailed {
                attempt,
                target,
                source,
            } => RetryError::ReloadFailed {
                attempt,
                target,
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_exhausted_error() {
        let err: RetryError<io::Error> = RetryError::exhausted(
            3,
            io::Error::new(io::ErrorKind::TimedOut, "timeout"),
            Duration::from_secs(5),
        );

        assert!(err.is_exhausted());
        assert!(!err.is_deadline_elapsed());
        assert!(!err.is_non_retryable());
        assert!(!err.is_reload_failed());
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_deadline_elapsed_error() {
        let err: RetryError<io::Error> = RetryError::deadline_elapsed(
            4,
            io::Error::new(io::ErrorKind::TimedOut, "timeout"),
            Duration::from_millis(700),
            Duration::from_millis(812),
        );

        assert!(err.is_deadline_elapsed());
        assert_eq!(err.attempts(), 4);
        assert!(err.to_string().contains("deadline of 700ms"));
    }

    #[test]
    fn test_non_retryable_keeps_attempt() {
        let err: RetryError<io::Error> =
            RetryError::non_retryable(2, io::Error::new(io::ErrorKind::NotFound, "not found"));

        assert!(err.is_non_retryable());
        assert_eq!(err.attempts(), 2);
    }

    #[test]
    fn test_reload_failed_has_no_operation_source() {
        let err: RetryError<io::Error> =
            RetryError::reload_failed(1, "Service", anyhow::anyhow!("secret store offline"));

        assert!(err.is_reload_failed());
        assert!(err.source_ref().is_none());
        assert_eq!(
            err.reload_error().map(|e| e.to_string()),
            Some("secret store offline".to_string())
        );
        assert!(err.into_source().is_none());
    }

    #[test]
    fn test_into_source_returns_original() {
        let err: RetryError<String> =
            RetryError::exhausted(3, "original error".to_string(), Duration::from_secs(1));

        assert_eq!(err.into_source(), Some("original error".to_string()));
    }

    #[test]
    fn test_map_err() {
        let err: RetryError<i32> = RetryError::exhausted(3, 42, Duration::from_secs(1));

        let mapped = err.map_err(|n| format!("error code: {}", n));
        assert!(
            matches!(mapped, RetryError::Exhausted { source, .. } if source == "error code: 42")
        );
    }

    #[test]
    fn test_error_source_chain() {
        let err: RetryError<io::Error> = RetryError::exhausted(
            2,
            io::Error::new(io::ErrorKind::TimedOut, "connection timeout"),
            Duration::from_secs(1),
        );

        let source = Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection timeout");
    }

    #[test]
    fn test_display() {
        let err: RetryError<io::Error> = RetryError::exhausted(
            3,
            io::Error::new(io::ErrorKind::TimedOut, "connection timeout"),
            Duration::from_secs(5),
        );

        let display = format!("{}", err);
        assert!(display.contains("retry exhausted"));
        assert!(display.contains("3 attempts"));
        assert!(display.contains("connection timeout"));
    }
}
