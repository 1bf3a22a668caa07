mod cli;
mod commands;
mod config;
mod errors;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::{Commands, OutputFormat};
use errors::prelude::CliError;
use output::{CliResponse, OutputFormatter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_default())
        .init();

    let config_path = cli.config.as_deref();

    let exit_code = match run(&cli, config_path).await {
        Ok(()) => exitcode::OK,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: &Cli, config_path: Option<&str>) -> Result<(), CliError> {
    match &cli.command {
        Commands::Bucket(args) => {
            let response = commands::bucket::run(args, config_path).await?;
            print_response(&response, &cli.output)?;
        }
        Commands::Policy(args) => {
            let response = commands::policy::run(args, config_path)?;
            if cli.output == OutputFormat::Table {
                if let Some(data) = &response.data {
                    println!("{}", commands::policy::render_table(data));
                    return Ok(());
                }
            }
            print_response(&response, &cli.output)?;
        }
        Commands::Simulate(args) => {
            let response = commands::simulate::run(args, config_path).await?;
            print_response(&response, &cli.output)?;
        }
    }

    if let Some(path) = &cli.save_config {
        let loaded = config::load(config_path)?;
        config::save(&loaded, path)?;
    }

    Ok(())
}

fn print_response<T: serde::Serialize>(
    response: &CliResponse<T>,
    format: &OutputFormat,
) -> Result<(), CliError> {
    OutputFormatter::print(response, format)
}
