use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Keyword blocker: find feed posts matching keyword rules and block their authors.
#[derive(Parser, Debug, Clone)]
#[command(name = "keyword-blocker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Runner configuration (RON). Missing file means defaults.
    #[arg(short, long, default_value = "blocker.ron")]
    pub config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Report which posts of a saved feed page would be blocked, without acting
    Scan {
        /// Saved feed page (HTML)
        snapshot: PathBuf,

        /// Rule to use instead of the stored block words; repeatable
        #[arg(short, long = "rule")]
        rules: Vec<String>,
    },

    /// Run the full block pipeline against a saved feed page
    Rehearse {
        /// Saved feed page (HTML)
        snapshot: PathBuf,

        /// How the simulated user answers confirmation sheets in manual mode
        #[arg(short, long, value_enum, default_value_t = Answer::Confirm)]
        answer: Answer,

        /// Write the page as it looks afterwards
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Confirm,
    Cancel,
    /// Leave the sheet open until the manual-confirm deadline
    Wait,
}
