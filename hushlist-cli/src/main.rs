//! ## hushlist-cli
//! **Operator entrypoint for the notification filter**
//!
//! Replays scenarios against the simulated host, lists the apps a scenario
//! installs, and validates configuration files.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
