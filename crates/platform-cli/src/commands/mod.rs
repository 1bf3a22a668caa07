pub mod bucket;
pub mod policy;
pub mod simulate;

use clap::Subcommand;

/// Output format, mirrored from `vkteams-bot-cli::commands::OutputFormat`.
#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Table,
    Quiet,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single `acquire()` against a bucket and print the decision.
    Bucket(bucket::BucketArgs),
    /// Print the active plan-to-limit policy table.
    Policy(policy::PolicyArgs),
    /// Simulate a burst of requests against an in-memory bucket.
    Simulate(simulate::SimulateArgs),
}
