//! CLI command implementations
//!
//! Every scenario drives a [`FlakyService`] through the retry executor and
//! reports how the sequence ended.

pub mod attempts;
pub mod mismatch;
pub mod policy;
pub mod reload;
pub mod timeout;

use std::time::Instant;

use anyhow::Result;
use reattempt_core::retry::{CategoryClassifier, RetryExecutorBuilder, TracingObserver};
use reattempt_core::types::RetryPolicy;

use crate::report::{Outcome, RunReport};
use crate::services::{FailureKind, FlakyService};

/// A retry run against a simulated service
pub struct Scenario<'a> {
    pub name: &'a str,
    pub policy: RetryPolicy,
    pub retry_on: Vec<FailureKind>,
    pub reload: bool,
    pub value: bool,
}

/// Run the scenario and collect its report
pub fn execute(scenario: &Scenario<'_>, service: &FlakyService) -> RunReport {
    let mut builder = RetryExecutorBuilder::new()
        .with_policy(scenario.policy.clone())
        .with_classifier(CategoryClassifier::any_of(scenario.retry_on.iter().copied()))
        .with_observer(TracingObserver::new(scenario.name));

    if scenario.reload {
        builder = builder.with_reload_target(service);
    }

    let executor = builder.build();
    let started = Instant::now();

    let result = if scenario.value {
        executor.execute(|| service.do_something_else()).map(Some)
    } else {
        executor.execute(|| service.do_something()).map(|()| None)
    };

    RunReport::new(
        scenario.name,
        &scenario.policy,
        service,
        &result,
        started.elapsed(),
    )
}

/// Print the report and turn a failed outcome into an error exit
pub fn finish(report: RunReport, json: bool) -> Result<()> {
    report.print(json)?;

    if report.outcome != Outcome::Success {
        anyhow::bail!(
            "scenario '{}' ended with {}",
            report.scenario,
            report.outcome.label()
        );
    }

    Ok(())
}
