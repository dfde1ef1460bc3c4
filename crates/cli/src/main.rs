//! swcache command line entry point.
//!
//! Operates on the same stores as the MCP server, configured the same way.

mod cli;
mod commands;

use std::process;

use anyhow::Result;
use clap::Parser;
use swcache_core::AppConfig;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::{Args, Commands};
use crate::commands::CommandExecutor;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = AppConfig::load_from(args.config.as_deref())?;
    tracing::debug!(origin = %config.origin, version = %config.cache_version, "loaded configuration");

    let executor = CommandExecutor::new(&config, args.output).await?;

    match args.command {
        Commands::Status => executor.status().await,
        Commands::Clear => executor.clear().await,
        Commands::Install => executor.install().await,
        Commands::Activate => executor.activate().await,
        Commands::Update { since } => executor.update(since).await,
        Commands::Classify { url, method, accept } => executor.classify(&url, &method, accept),
        Commands::Fetch { url, method, accept, data, body } => {
            executor.fetch(&url, &method, accept, data, body).await
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
