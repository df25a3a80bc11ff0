use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use tileroute_cli::{init_tracing, render_record, run, Cli};
use tileroute_lib::RouteConfig;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = RouteConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    init_tracing(config.logging_level());

    let route = run(&cli, &config)?;
    println!("{}", render_record(&route.record, cli.format)?);

    match route.outcome() {
        Some(outcome) if outcome.is_fatal() => Ok(ExitCode::FAILURE),
        _ => Ok(ExitCode::SUCCESS),
    }
}
