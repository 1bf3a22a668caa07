use crate::commands::{Commands, OutputFormat};
use clap::{Parser, ValueHint};

/// Top-level argument structure, mirrored from `vkteams-bot-cli::cli::Cli`.
#[derive(Parser, Debug)]
#[command(
    name = "platform-cli",
    version,
    about = "Operational CLI for the deployment platform's rate limiter",
    long_about = "Inspect bucket state, print the active policy table, and \
                  simulate load against the token-bucket limiter without a \
                  running server."
)]
pub struct Cli {
    /// Path to a limiter config file (overrides the default search path)
    #[arg(short, long, value_name = "CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Write the resolved config back out to this path and exit
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub save_config: Option<String>,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}
