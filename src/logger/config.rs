//! The `[logger]` configuration section.
//!
//! These types deserialize directly from the merged configuration, so the
//! same value is validated at load time and handed to [`init_logger`].
//!
//! [`init_logger`]: crate::logger::init_logger

use crate::logger::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// trace, debug, info, warn or error (any case)
    pub level: String,
    pub console: ConsoleConfig,
    pub file: FileConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// The configured verbosity.
    pub fn level(&self) -> Result<Level, LoggerError> {
        self.level.parse::<Level>().map_err(|_| {
            LoggerError::config(format!(
                "unknown log level '{}', expected trace, debug, info, warn or error",
                self.level
            ))
        })
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        self.level()?;

        if !self.console.enabled && !self.file.enabled {
            return Err(LoggerError::config(
                "console and file output are both disabled",
            ));
        }
        if self.file.enabled && self.file.path.as_os_str().is_empty() {
            return Err(LoggerError::config("file output is enabled without a path"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// ANSI colors; only honored when stdout is a terminal
    pub colored: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    /// Parent directories are created when the writer opens the file
    pub path: PathBuf,
    /// Truncate on startup when false
    pub append: bool,
    pub format: LogFormat,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/app.log"),
            append: true,
            format: LogFormat::Json,
        }
    }
}

/// Line format of the log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Full,
    Compact,
    #[default]
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let config = LoggerConfig {
            level: "WARN".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level().unwrap(), Level::WARN);

        let config = LoggerConfig {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LoggerError::Config { .. })));
    }

    #[test]
    fn test_needs_an_output() {
        let config = LoggerConfig {
            console: ConsoleConfig {
                enabled: false,
                colored: false,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enabled_file_requires_path() {
        let mut config = LoggerConfig::default();
        config.file.path = PathBuf::new();
        assert!(config.validate().is_ok());

        config.file.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_section_deserializes_with_defaults() {
        let config: LoggerConfig = toml::from_str(
            r#"
            level = "debug"
            [file]
            enabled = true
            format = "compact"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert!(config.console.enabled);
        assert!(config.file.enabled);
        assert!(config.file.append);
        assert_eq!(config.file.path, PathBuf::from("logs/app.log"));
        assert_eq!(config.file.format, LogFormat::Compact);

        assert!(toml::from_str::<LoggerConfig>("[file]\nformat = \"xml\"").is_err());
    }
}
