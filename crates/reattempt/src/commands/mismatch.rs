//! Mismatch command

use anyhow::Result;
use reattempt_core::types::RetryPolicy;

use super::Scenario;
use crate::cli::MismatchArgs;
use crate::services::FlakyService;

pub fn run(args: MismatchArgs, json: bool) -> Result<()> {
    let service = FlakyService::failing(1).fail_with(args.fail_with);
    let scenario = scenario(&args);

    super::finish(super::execute(&scenario, &service), json)
}

fn scenario(args: &MismatchArgs) -> Scenario<'static> {
    Scenario {
        name: "mismatch",
        policy: RetryPolicy::attempts(args.max_attempts),
        retry_on: vec![args.retry_on],
        reload: false,
        value: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;
    use crate::services::FailureKind;

    #[test]
    fn test_unmatched_category_fails_on_first_attempt() {
        let args = MismatchArgs {
            fail_with: FailureKind::InvalidOperation,
            retry_on: FailureKind::InvalidArgument,
            max_attempts: 3,
        };
        let service = FlakyService::failing(1).fail_with(args.fail_with);

        let report = super::super::execute(&scenario(&args), &service);

        assert_eq!(report.outcome, Outcome::NonRetryable);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.category, Some(FailureKind::InvalidOperation));
    }

    #[test]
    fn test_matched_category_is_retried() {
        let args = MismatchArgs {
            fail_with: FailureKind::InvalidArgument,
            retry_on: FailureKind::InvalidArgument,
            max_attempts: 3,
        };
        let service = FlakyService::failing(1).fail_with(args.fail_with);

        let report = super::super::execute(&scenario(&args), &service);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.attempts, 2);
    }
}
