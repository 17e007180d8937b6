//! Reclaim CLI - inspect and manage the resource candidate cache.

use clap::Parser;
use reclaim_cli::commands;
use reclaim_cli::{Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> reclaim_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Check(args) => commands::execute_check(args, &formatter)?,
        Command::Owners(args) => commands::execute_owners(args, &formatter)?,
        Command::Candidates(args) => commands::execute_candidates(args, &formatter)?,
        Command::Release(args) => commands::execute_release(args, &formatter)?,
        Command::Notify(args) => commands::execute_notify(args, &formatter).await?,
    }

    Ok(())
}
