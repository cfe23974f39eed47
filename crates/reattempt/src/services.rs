//! Simulated services with scripted failures

use std::cell::Cell;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use reattempt_core::retry::{Categorized, Reloadable};
use serde::Serialize;
use thiserror::Error;

/// Category of a simulated failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The service is in a state that cannot serve the call yet
    InvalidOperation,
    /// The call itself was rejected
    InvalidArgument,
}

/// Failure raised by a simulated service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ServiceError {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        match kind {
            FailureKind::InvalidOperation => ServiceError::InvalidOperation(message.into()),
            FailureKind::InvalidArgument => ServiceError::InvalidArgument(message.into()),
        }
    }
}

impl Categorized for ServiceError {
    type Category = FailureKind;

    fn category(&self) -> FailureKind {
        match self {
            ServiceError::InvalidOperation(_) => FailureKind::InvalidOperation,
            ServiceError::InvalidArgument(_) => FailureKind::InvalidArgument,
        }
    }
}

/// When a [`FlakyService`] starts succeeding
#[derive(Debug, Clone, Copy)]
enum Recovery {
    AfterFailures(u32),
    AfterElapsed(Duration),
}

/// A service that fails until it recovers, and can reload its settings
pub struct FlakyService {
    recovery: Recovery,
    fail_with: FailureKind,
    reload_fails: bool,
    started: Instant,
    attempts: Cell<u32>,
    reloads: Cell<u32>,
}

impl FlakyService {
    /// Fail the first `times` calls
    pub fn failing(times: u32) -> Self {
        Self::with_recovery(Recovery::AfterFailures(times))
    }

    /// Fail every call made before `elapsed` has passed since creation
    pub fn recovering_after(elapsed: Duration) -> Self {
        Self::with_recovery(Recovery::AfterElapsed(elapsed))
    }

    fn with_recovery(recovery: Recovery) -> Self {
        Self {
            recovery,
            fail_with: FailureKind::InvalidOperation,
            reload_fails: false,
            started: Instant::now(),
            attempts: Cell::new(0),
            reloads: Cell::new(0),
        }
    }

    /// Fail with this category instead of `InvalidOperation`
    pub fn fail_with(mut self, kind: FailureKind) -> Self {
        self.fail_with = kind;
        self
    }

    /// Make every reload fail
    pub fn with_failing_reload(mut self) -> Self {
        self.reload_fails = true;
        self
    }

    /// Calls made so far
    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    /// Reloads performed so far
    pub fn reloads(&self) -> u32 {
        self.reloads.get()
    }

    /// Perform an operation that returns nothing
    pub fn do_something(&self) -> Result<(), ServiceError> {
        self.call().map(|_| ())
    }

    /// Perform an operation that returns a value
    pub fn do_something_else(&self) -> Result<i32, ServiceError> {
        self.call()
    }

    fn call(&self) -> Result<i32, ServiceError> {
        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);

        let recovered = match self.recovery {
            Recovery::AfterFailures(times) => attempt > times,
            Recovery::AfterElapsed(elapsed) => self.started.elapsed() >= elapsed,
        };

        if !recovered {
            tracing::debug!(attempt, "simulated service call failed");
            return Err(ServiceError::new(
                self.fail_with,
                format!("call {} failed before the service recovered", attempt),
            ));
        }

        tracing::debug!(attempt, "simulated service call completed");
        Ok(i32::try_from(attempt).unwrap_or(i32::MAX))
    }
}

impl Reloadable for FlakyService {
    fn reload(&self) -> anyhow::Result<()> {
        self.reloads.set(self.reloads.get() + 1);
        if self.reload_fails {
            anyhow::bail!("settings source is unavailable");
        }
        tracing::debug!(reloads = self.reloads.get(), "reloaded service settings");
        Ok(())
    }
}
