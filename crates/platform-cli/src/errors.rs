//! CLI error type, mirrored from `vkteams-bot-cli::errors`.

use std::fmt;

pub static LIMITER_ERROR: &str = "Limiter Error: ";
pub static INPUT_ERROR: &str = "Input Error: ";
pub static UNEXPECTED_ERROR: &str = "Unexpected Error: ";

#[derive(Debug)]
pub enum CliError {
    /// Error surfaced by `ratelimit_core` itself.
    Limiter(ratelimit_core::LimiterError),
    /// Invalid CLI arguments.
    Input(String),
    /// Config file or serialization failure.
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl From<ratelimit_core::LimiterError> for CliError {
    fn from(error: ratelimit_core::LimiterError) -> Self {
        CliError::Limiter(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Unexpected(error.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Unexpected(format!("JSON error: {error}"))
    }
}

impl From<toml::de::Error> for CliError {
    fn from(error: toml::de::Error) -> Self {
        CliError::Unexpected(format!("TOML error: {error}"))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Limiter(err) => write!(f, "{LIMITER_ERROR}{err}"),
            CliError::Input(err) => write!(f, "{INPUT_ERROR}{err}"),
            CliError::Unexpected(err) => write!(f, "{UNEXPECTED_ERROR}{err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Limiter(_) => exitcode::UNAVAILABLE,
            CliError::Input(_) => exitcode::USAGE,
            CliError::Unexpected(_) => exitcode::SOFTWARE,
        }
    }
}

pub mod prelude {
    pub use super::{CliError, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_display_and_exit_code() {
        let err = CliError::Input("missing identifier".to_string());
        assert!(format!("{err}").contains("Input Error:"));
        assert_eq!(err.exit_code(), exitcode::USAGE);
    }

    #[test]
    fn limiter_error_display_and_exit_code() {
        let err: CliError =
            ratelimit_core::LimiterError::InvalidRequest("bad identifier".into()).into();
        assert!(format!("{err}").contains("Limiter Error:"));
        assert_eq!(err.exit_code(), exitcode::UNAVAILABLE);
    }
}
