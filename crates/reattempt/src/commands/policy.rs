//! Policy commands

use anyhow::{Context, Result};
use camino::Utf8Path;
use reattempt_core::types::{RetryPoliciesConfig, RetryPolicy};
use reattempt_core::RetryConfigLoader;

use super::Scenario;
use crate::cli::PolicyArgs;
use crate::output;
use crate::services::{FailureKind, FlakyService};

pub fn run(args: PolicyArgs, config_path: Option<&Utf8Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let policy = config.policy_for(&args.operation).clone();

    tracing::info!(
        operation = %args.operation,
        policy = %describe(&policy),
        "resolved retry policy"
    );

    let service = FlakyService::failing(args.fail_times);
    let scenario = scenario(&args, policy);

    super::finish(super::execute(&scenario, &service), json)
}

/// Show the resolved policies
pub fn show(config_path: Option<&Utf8Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    output::header("Retry policies");
    output::kv("default", &describe(&config.default));

    let mut names: Vec<&String> = config.operations.keys().collect();
    names.sort();
    for name in names {
        output::kv(name, &describe(config.policy_for(name)));
    }

    println!();
    output::info("Resolved configuration:");
    print!("{}", serde_yaml_ng::to_string(&config)?);

    Ok(())
}

fn load_config(path: Option<&Utf8Path>) -> Result<RetryPoliciesConfig> {
    let loader = RetryConfigLoader::new()?;

    let config = match path {
        Some(path) => loader
            .load_file(path)
            .with_context(|| format!("Failed to load retry policies from {}", path))?,
        None => loader.load().context("Failed to load retry policies")?,
    };

    Ok(config)
}

fn scenario(args: &PolicyArgs, policy: RetryPolicy) -> Scenario<'_> {
    Scenario {
        name: &args.operation,
        policy,
        retry_on: vec![FailureKind::InvalidOperation, FailureKind::InvalidArgument],
        reload: args.reload,
        value: true,
    }
}

fn describe(policy: &RetryPolicy) -> String {
    match policy.delay {
        Some(delay) if !delay.is_zero() => {
            format!("{}, {}ms delay", policy.stopping, delay.as_millis())
        }
        _ => policy.stopping.to_string(),
    }
}
