//! Unified output formatting, mirrored from `vkteams-bot-cli::output`.

use crate::commands::OutputFormat;
use crate::errors::prelude::CliError;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub command: String,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(command: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
            command: command.into(),
        }
    }

    pub fn error(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
            command: command.into(),
        }
    }
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn print<T: Serialize>(
        response: &CliResponse<T>,
        format: &OutputFormat,
    ) -> Result<(), CliError> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(response)?;
                println!("{json}");
            }
            OutputFormat::Pretty | OutputFormat::Table => {
                Self::print_pretty(response)?;
            }
            OutputFormat::Quiet => {
                if !response.success {
                    if let Some(error) = &response.error {
                        eprintln!("{}", error.red());
                    }
                }
            }
        }
        Ok(())
    }

    fn print_pretty<T: Serialize>(response: &CliResponse<T>) -> Result<(), CliError> {
        if response.success {
            println!("{} {}", "\u{2713}".green(), "Success".green().bold());
            if let Some(data) = &response.data {
                let data_json = serde_json::to_value(data)?;
                match data_json {
                    serde_json::Value::Object(map) => {
                        for (key, value) in map {
                            println!("  {}: {}", key.cyan(), Self::format_value(&value));
                        }
                    }
                    other => println!("  {}", Self::format_value(&other)),
                }
            }
        } else {
            println!("{} {}", "\u{2717}".red(), "Error".red().bold());
            if let Some(error) = &response.error {
                println!("  {}", error.red());
            }
        }

        println!();
        println!("{}: {}", "Command".dimmed(), response.command.dimmed());
        println!(
            "{}: {}",
            "Timestamp".dimmed(),
            response
                .timestamp
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .dimmed()
        );
        Ok(())
    }

    fn format_value(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => "null".dimmed().to_string(),
            serde_json::Value::Array(arr) => format!("[{} items]", arr.len()),
            serde_json::Value::Object(obj) => format!("{{{} fields}}", obj.len()),
        }
    }
}
