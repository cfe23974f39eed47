//! Timeout command

use std::time::Duration;

use anyhow::Result;
use reattempt_core::types::RetryPolicy;

use super::Scenario;
use crate::cli::TimeoutArgs;
use crate::services::{FailureKind, FlakyService};

pub fn run(args: TimeoutArgs, json: bool) -> Result<()> {
    // The service clock starts before the executor's deadline is computed
    let service = FlakyService::recovering_after(Duration::from_millis(args.recover_after_ms));
    let scenario = scenario(&args);

    super::finish(super::execute(&scenario, &service), json)
}

fn scenario(args: &TimeoutArgs) -> Scenario<'static> {
    Scenario {
        name: "timeout",
        policy: RetryPolicy::deadline(Duration::from_millis(args.timeout_ms))
            .with_delay(Duration::from_millis(args.delay_ms)),
        retry_on: vec![FailureKind::InvalidOperation],
        reload: false,
        value: args.value,
    }
}
