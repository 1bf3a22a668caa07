//! One-shot config loading for the CLI: no `Lazy` singleton, since each
//! invocation runs a single command and exits.

use crate::errors::prelude::{CliError, Result};
use ratelimit_core::LimiterConfig;

pub fn load(path: Option<&str>) -> Result<LimiterConfig> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            let config: LimiterConfig = toml::from_str(&contents)?;
            Ok(config)
        }
        None => Ok(LimiterConfig::default()),
    }
}

pub fn save(config: &LimiterConfig, path: &str) -> Result<()> {
    let serialized =
        toml::to_string_pretty(config).map_err(|e| CliError::Unexpected(e.to_string()))?;
    std::fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_falls_back_to_default() {
        let config = load(None).unwrap();
        assert_eq!(config.key_prefix, LimiterConfig::default().key_prefix);
    }

    #[test]
    fn nonexistent_file_is_an_error() {
        let err = load(Some("/nonexistent/path/limiter.toml")).unwrap_err();
        assert!(matches!(err, CliError::Unexpected(_)));
    }
}
