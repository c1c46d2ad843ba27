//! Configuration merger for CLI arguments and config files
//!
//! CLI arguments sit on top of the layered file/environment configuration
//! and are validated together with it.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides on top of file-based configuration.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the CLI points at.
    ///
    /// `--config` selects a single file, `--env` the environment layer;
    /// otherwise the loader's environment-variable defaults apply.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = &cli.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        Ok(Self::new(loader.load()?))
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// CLI arguments have the highest priority. The merged result is
    /// validated again.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

fn apply_command_overrides(config: &mut Settings, command: &Commands) {
    match command {
        Commands::Serve {
            host,
            port,
            backend,
            log_level,
            dry_run: _,
        } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(backend) = backend {
                config.database.backend = (*backend).into();
            }
            // Command-specific level wins over --verbose/--quiet.
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }
        Commands::Migrate { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parser::Cli;
    use crate::config::StorageBackend;
    use clap::Parser;

    fn merged(args: &[&str]) -> Result<Settings, ConfigError> {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default()).merge_cli_args(&cli)
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merged(&["backoffice-rs", "--verbose"]).unwrap().logger.level, "debug");
        assert_eq!(merged(&["backoffice-rs", "--quiet"]).unwrap().logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port() {
        let config = merged(&["backoffice-rs", "serve", "--host", "0.0.0.0", "--port", "8080"])
            .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let config =
            merged(&["backoffice-rs", "--verbose", "serve", "--log-level", "warn"]).unwrap();
        assert_eq!(config.logger.level, "warn");
    }

    #[test]
    fn test_backend_override_is_validated() {
        // Postgres without a URL fails validation after the merge.
        let result = merged(&["backoffice-rs", "serve", "--backend", "postgres"]);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));

        let config = merged(&["backoffice-rs", "serve", "--backend", "memory"]).unwrap();
        assert_eq!(config.database.backend, StorageBackend::Memory);
    }
}
