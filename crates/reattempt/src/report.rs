//! Outcome reports for demo runs

use std::time::Duration;

use reattempt_core::retry::{Categorized, RetryError};
use reattempt_core::types::RetryPolicy;
use serde::Serialize;

use crate::output;
use crate::services::{FailureKind, FlakyService, ServiceError};

/// How a retry sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    NonRetryable,
    Exhausted,
    DeadlineElapsed,
    ReloadFailed,
}

impl Outcome {
    pub fn of<T, E>(result: &Result<T, RetryError<E>>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(RetryError::NonRetryable { .. }) => Outcome::NonRetryable,
            Err(RetryError::Exhausted { .. }) => Outcome::Exhausted,
            Err(RetryError::DeadlineElapsed { .. }) => Outcome::DeadlineElapsed,
            Err(RetryError::ReloadFailed { .. }) => Outcome::ReloadFailed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NonRetryable => "non-retryable failure",
            Outcome::Exhausted => "attempts exhausted",
            Outcome::DeadlineElapsed => "deadline elapsed",
            Outcome::ReloadFailed => "reload failed",
        }
    }
}

/// Summary of a single demo run
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunReport {
    pub scenario: String,
    pub policy: String,
    pub delay_ms: u64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    pub attempts: u32,
    pub reloads: u32,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(
        scenario: &str,
        policy: &RetryPolicy,
        service: &FlakyService,
        result: &Result<Option<i32>, RetryError<ServiceError>>,
        elapsed: Duration,
    ) -> Self {
        let (value, category, error) = match result {
            Ok(value) => (*value, None, None),
            Err(err) => (
                None,
                err.source_ref().map(|e| e.category()),
                Some(err.to_string()),
            ),
        };

        Self {
            scenario: scenario.to_string(),
            policy: policy.stopping.to_string(),
            delay_ms: policy.delay().as_millis() as u64,
            outcome: Outcome::of(result),
            value,
            attempts: service.attempts(),
            reloads: service.reloads(),
            elapsed_ms: elapsed.as_millis() as u64,
            category,
            error,
        }
    }

    /// Print the report as JSON or as a human summary
    pub fn print(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        output::header(&format!("Scenario: {}", self.scenario));
        output::kv("Policy", &self.policy);
        output::kv("Delay", &format!("{}ms", self.delay_ms));
        output::kv("Attempts", &self.attempts.to_string());
        output::kv("Reloads", &self.reloads.to_string());
        output::kv("Elapsed", &format!("{}ms", self.elapsed_ms));

        match (&self.outcome, &self.error) {
            (Outcome::Success, _) => match self.value {
                Some(value) => output::success(&format!("Completed with result {}", value)),
                None => output::success("Completed"),
            },
            (outcome, Some(error)) => {
                output::error(&format!("{}: {}", outcome.label(), error));
            }
            (outcome, None) => output::error(outcome.label()),
        }

        Ok(())
    }
}
