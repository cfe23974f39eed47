//! Attempts command

use std::time::Duration;

use anyhow::Result;
use reattempt_core::types::RetryPolicy;

use super::Scenario;
use crate::cli::AttemptsArgs;
use crate::services::{FailureKind, FlakyService};

pub fn run(args: AttemptsArgs, json: bool) -> Result<()> {
    let service = FlakyService::failing(args.fail_times);
    let scenario = scenario(&args);

    super::finish(super::execute(&scenario, &service), json)
}

fn scenario(args: &AttemptsArgs) -> Scenario<'static> {
    Scenario {
        name: "attempts",
        policy: RetryPolicy::attempts(args.max_attempts)
            .with_delay(Duration::from_millis(args.delay_ms)),
        retry_on: vec![FailureKind::InvalidOperation],
        reload: false,
        value: args.value,
    }
}
