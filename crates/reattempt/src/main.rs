//! reattempt CLI - drives the retry executor against simulated flaky services
//!
//! This is the main entry point for the reattempt command-line interface.

mod cli;
mod commands;
mod output;
mod report;
mod services;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Attempts(args) => commands::attempts::run(args, cli.json),
        Commands::Timeout(args) => commands::timeout::run(args, cli.json),
        Commands::Reload(args) => commands::reload::run(args, cli.json),
        Commands::Mismatch(args) => commands::mismatch::run(args, cli.json),
        Commands::Policy(args) => commands::policy::run(args, cli.config.as_deref(), cli.json),
        Commands::Policies => commands::policy::show(cli.config.as_deref(), cli.json),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Retry events are logged at info, so show them by default
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
