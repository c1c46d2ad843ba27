//! Configuration error types

use thiserror::Error;

/// Errors raised while locating, parsing or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value is outside its accepted range
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        /// Dotted key of the offending value, e.g. `server.port`
        field: String,
        message: String,
    },

    /// `BACKOFFICE_APP_ENV` (or `--env`) named an unknown environment
    #[error("Environment variable error: {0}")]
    EnvVarError(String),

    /// Two configuration sources were selected at once
    #[error("Mutual exclusivity error: {0}")]
    MutualExclusivityError(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_the_field() {
        let err = ConfigError::validation("server.port", format!("bad port {}", 0));
        assert_eq!(err.to_string(), "Validation error: server.port - bad port 0");
    }

    #[test]
    fn test_file_not_found_message() {
        let err = ConfigError::file_not_found("config/default.toml");
        assert_eq!(
            err.to_string(),
            "Configuration file not found: config/default.toml"
        );
    }
}
