//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::services::FailureKind;

/// reattempt - retry executor playground
#[derive(Parser, Debug)]
#[command(name = "reattempt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a retry policy file (defaults to ~/.reattempt/retry.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Print the outcome as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retry a fixed number of times
    Attempts(AttemptsArgs),

    /// Retry until a deadline passes
    Timeout(TimeoutArgs),

    /// Retry with the service reloading itself before every retry
    Reload(ReloadArgs),

    /// Fail with a category the classifier does not retry
    Mismatch(MismatchArgs),

    /// Retry with a named policy from the configuration
    Policy(PolicyArgs),

    /// Show the resolved retry policies
    Policies,
}

#[derive(Args, Debug)]
pub struct AttemptsArgs {
    /// Attempts allowed in total
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Number of calls that fail before the service recovers
    #[arg(long, default_value_t = 2)]
    pub fail_times: u32,

    /// Wait before every retry, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// Use the value-returning operation
    #[arg(long)]
    pub value: bool,
}

#[derive(Args, Debug)]
pub struct TimeoutArgs {
    /// Deadline for the whole retry sequence, in milliseconds
    #[arg(long, default_value_t = 700)]
    pub timeout_ms: u64,

    /// The service fails until this many milliseconds after it starts
    #[arg(long, default_value_t = 900)]
    pub recover_after_ms: u64,

    /// Wait before every retry, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Use the value-returning operation
    #[arg(long)]
    pub value: bool,
}

#[derive(Args, Debug)]
pub struct ReloadArgs {
    /// Attempts allowed in total
    #[arg(long, default_value_t = 2)]
    pub max_attempts: u32,

    /// Number of calls that fail before the service recovers
    #[arg(long, default_value_t = 1)]
    pub fail_times: u32,

    /// Make the reload itself fail
    #[arg(long)]
    pub fail_reload: bool,

    /// Use the value-returning operation
    #[arg(long)]
    pub value: bool,
}

#[derive(Args, Debug)]
pub struct MismatchArgs {
    /// Category the service fails with
    #[arg(long, value_enum, default_value_t = FailureKind::InvalidOperation)]
    pub fail_with: FailureKind,

    /// Category the classifier retries
    #[arg(long, value_enum, default_value_t = FailureKind::InvalidArgument)]
    pub retry_on: FailureKind,

    /// Attempts allowed in total
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
}

#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Operation name to look up (falls back to the default policy)
    #[arg(long, default_value = "default")]
    pub operation: String,

    /// Number of calls that fail before the service recovers
    #[arg(long, default_value_t = 1)]
    pub fail_times: u32,

    /// Reload the service before every retry
    #[arg(long)]
    pub reload: bool,
}
