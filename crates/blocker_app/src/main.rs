mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::config::RunnerConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RunnerConfig::load(&cli.config)?;
    logging::initialize(cli.verbose, config.log_file.as_deref());

    match cli.command {
        Command::Scan { snapshot, rules } => commands::scan(&config, &snapshot, &rules),
        Command::Rehearse {
            snapshot,
            answer,
            output,
        } => commands::rehearse(&config, &snapshot, answer, output.as_deref()).await,
    }
}
