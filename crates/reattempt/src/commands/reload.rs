//! Reload command

use anyhow::Result;
use reattempt_core::types::RetryPolicy;

use super::Scenario;
use crate::cli::ReloadArgs;
use crate::services::{FailureKind, FlakyService};

pub fn run(args: ReloadArgs, json: bool) -> Result<()> {
    let service = service(&args);
    let scenario = scenario(&args);

    super::finish(super::execute(&scenario, &service), json)
}

fn service(args: &ReloadArgs) -> FlakyService {
    let service = FlakyService::failing(args.fail_times);
    if args.fail_reload {
        service.with_failing_reload()
    } else {
        service
    }
}

fn scenario(args: &ReloadArgs) -> Scenario<'static> {
    Scenario {
        name: "reload",
        policy: RetryPolicy::attempts(args.max_attempts),
        retry_on: vec![FailureKind::InvalidOperation],
        reload: true,
        value: args.value,
    }
}
