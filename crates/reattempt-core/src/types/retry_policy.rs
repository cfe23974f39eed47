use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Attempts made when no stopping policy is given
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Rule bounding a retry sequence
///
/// Exactly one bound applies per call: either a fixed number of attempts or
/// a deadline computed once, before the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingPolicy {
    /// Stop after this many attempts in total (including the first)
    Attempts(u32),

    /// Stop retrying once this much time has passed since the first attempt started
    Deadline(Duration),
}

impl Default for StoppingPolicy {
    fn default() -> Self {
        StoppingPolicy::Attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl fmt::Display for StoppingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoppingPolicy::Attempts(n) => write!(f, "{} attempts", n),
            StoppingPolicy::Deadline(timeout) => write!(f, "deadline of {}ms", timeout.as_millis()),
        }
    }
}

/// Reasons a retry policy cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Both an attempt count and a timeout were given
    #[error("max-attempts and timeout-ms are mutually exclusive")]
    ConflictingBounds,

    /// An attempt count of zero
    #[error("max-attempts must be at least 1")]
    ZeroAttempts,
}

/// Retry policy for an operation
///
/// Serialized as a flat kebab-case map carrying either `max-attempts` or
/// `timeout-ms`, plus an optional `delay-ms`:
///
/// ```yaml
/// max-attempts: 3
/// delay-ms: 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "PolicySpec", into = "PolicySpec")]
pub struct RetryPolicy {
    /// Bound on the retry sequence
    pub stopping: StoppingPolicy,

    /// Fixed wait inserted before every retry
    pub delay: Option<Duration>,
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` attempts in total
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            stopping: StoppingPolicy::Attempts(max_attempts),
            delay: None,
        }
    }

    /// Policy retrying until `timeout` has passed since the first attempt
    pub fn deadline(timeout: Duration) -> Self {
        Self {
            stopping: StoppingPolicy::Deadline(timeout),
            delay: None,
        }
    }

    /// Set the fixed delay inserted before every retry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The delay before each retry, zero when none is configured
    pub fn delay(&self) -> Duration {
        self.delay.unwrap_or(Duration::ZERO)
    }

    /// Maximum attempts for count-bounded policies
    pub fn max_attempts(&self) -> Option<u32> {
        match self.stopping {
            StoppingPolicy::Attempts(n) => Some(n),
            StoppingPolicy::Deadline(_) => None,
        }
    }

    /// Timeout for deadline-bounded policies
    pub fn timeout(&self) -> Option<Duration> {
        match self.stopping {
            StoppingPolicy::Attempts(_) => None,
            StoppingPolicy::Deadline(timeout) => Some(timeout),
        }
    }

    /// Check the policy is usable as configured
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.stopping == StoppingPolicy::Attempts(0) {
            return Err(PolicyError::ZeroAttempts);
        }
        Ok(())
    }
}

/// Wire shape of a [`RetryPolicy`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_attempts: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    delay_ms: Option<u64>,
}

impl TryFrom<PolicySpec> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(spec: PolicySpec) -> Result<Self, Self::Error> {
        let stopping = match (spec.max_attempts, spec.timeout_ms) {
            (Some(_), Some(_)) => return Err(PolicyError::ConflictingBounds),
            (Some(n), None) => StoppingPolicy::Attempts(n),
            (None, Some(ms)) => StoppingPolicy::Deadline(Duration::from_millis(ms)),
            (None, None) => StoppingPolicy::default(),
        };

        let policy = RetryPolicy {
            stopping,
            delay: spec.delay_ms.map(Duration::from_millis),
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl From<RetryPolicy> for PolicySpec {
    fn from(policy: RetryPolicy) -> Self {
        let (max_attempts, timeout_ms) = match policy.stopping {
            StoppingPolicy::Attempts(n) => (Some(n), None),
            StoppingPolicy::Deadline(timeout) => (None, Some(timeout.as_millis() as u64)),
        };
        PolicySpec {
            max_attempts,
            timeout_ms,
            delay_ms: policy.delay.map(|d| d.as_millis() as u64),
        }
    }
}

/// Retry policy configurations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl RetryPoliciesConfig {
    /// Policy for a named operation, falling back to the default
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_two_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.stopping, StoppingPolicy::Attempts(2));
        assert_eq!(policy.delay(), Duration::ZERO);
    }

    #[test]
    fn test_parse_attempts_policy() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("max-attempts: 4\ndelay-ms: 250\n").unwrap();
        assert_eq!(policy.max_attempts(), Some(4));
        assert_eq!(policy.delay(), Duration::from_millis(250));
        assert_eq!(policy.timeout(), None);
    }

    #[test]
    fn test_parse_deadline_policy() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("timeout-ms: 700\n").unwrap();
        assert_eq!(policy.timeout(), Some(Duration::from_millis(700)));
        assert_eq!(policy.delay, None);
    }

    #[test]
    fn test_delay_keeps_whole_seconds() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("max-attempts: 2\ndelay-ms: 1500\n").unwrap();
        assert_eq!(policy.delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_empty_map_uses_default_stopping() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_both_bounds_rejected() {
        let result: Result<RetryPolicy, _> =
            serde_yaml_ng::from_str("max-attempts: 3\ntimeout-ms: 100\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("mutually exclusive"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result: Result<RetryPolicy, _> = serde_yaml_ng::from_str("max-attempts: 0\n");
        assert!(result.unwrap_err().to_string().contains("at least 1"));
        assert_eq!(
            RetryPolicy::attempts(0).validate(),
            Err(PolicyError::ZeroAttempts)
        );
        assert_eq!(RetryPolicy::deadline(Duration::ZERO).validate(), Ok(()));
    }

    #[test]
    fn test_serialize_deadline_policy() {
        let policy = RetryPolicy::deadline(Duration::from_millis(900)).with_delay(Duration::from_millis(50));
        let yaml = serde_yaml_ng::to_string(&policy).unwrap();
        assert!(yaml.contains("timeout-ms: 900"));
        assert!(yaml.contains("delay-ms: 50"));
        assert!(!yaml.contains("max-attempts"));
    }

    #[test]
    fn test_policy_for_falls_back_to_default() {
        let mut config = RetryPoliciesConfig::default();
        config
            .operations
            .insert("download".to_string(), RetryPolicy::attempts(5));

        assert_eq!(config.policy_for("download").max_attempts(), Some(5));
        assert_eq!(config.policy_for("unknown"), &RetryPolicy::default());
    }

    #[test]
    fn test_stopping_policy_display() {
        assert_eq!(StoppingPolicy::Attempts(3).to_string(), "3 attempts");
        assert_eq!(
            StoppingPolicy::Deadline(Duration::from_millis(700)).to_string(),
            "deadline of 700ms"
        );
    }
}
