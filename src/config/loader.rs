//! Builds [`Settings`] from TOML files and `BACKOFFICE_*` variables.
//!
//! Layered mode reads, lowest priority first:
//! 1. `default.toml` (required)
//! 2. `{environment}.toml`
//! 3. `local.toml`
//!
//! Single-file mode reads exactly one file instead. In both modes
//! environment variables are applied last: `BACKOFFICE_DATABASE__BACKEND`
//! sets `database.backend`, with `__` separating nested keys.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Directory holding the layered files
pub const CONFIG_DIR_ENV: &str = "BACKOFFICE_CONFIG_DIR";

/// A single file replacing the layered directory
pub const CONFIG_FILE_ENV: &str = "BACKOFFICE_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "BACKOFFICE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Layered(PathBuf),
    SingleFile(PathBuf),
}

#[derive(Debug)]
pub struct ConfigLoader {
    source: Source,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Reads `BACKOFFICE_CONFIG_DIR`, `BACKOFFICE_CONFIG_FILE` and
    /// `BACKOFFICE_APP_ENV`. Setting both of the first two is an error.
    pub fn new() -> Result<Self, ConfigError> {
        let dir = std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from);
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);

        let source = match (dir, file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::mutual_exclusivity(format!(
                    "{CONFIG_DIR_ENV} and {CONFIG_FILE_ENV} cannot both be set"
                )));
            }
            (_, Some(file)) => Source::SingleFile(file),
            (dir, None) => {
                Source::Layered(dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)))
            }
        };

        Ok(Self {
            source,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Read exactly this file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Source::SingleFile(path.into());
        self
    }

    /// Read the layered files from this directory.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source = Source::Layered(dir.into());
        self
    }

    /// Selects the `{environment}.toml` layer.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// The files this loader reads, lowest priority first, paired with
    /// whether each one must exist.
    pub fn files(&self) -> Vec<(PathBuf, bool)> {
        match &self.source {
            Source::SingleFile(path) => vec![(path.clone(), true)],
            Source::Layered(dir) => vec![
                (dir.join("default.toml"), true),
                (dir.join(format!("{}.toml", self.environment)), false),
                (dir.join("local.toml"), false),
            ],
        }
    }

    /// Merge every source, deserialize and validate.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in self.files() {
            builder = add_file(builder, &path, required)?;
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }
}

fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if required && !path.is_file() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests in this module mutate process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const SERVICE_VARS: &[&str] = &[
        CONFIG_DIR_ENV,
        CONFIG_FILE_ENV,
        AppEnvironment::ENV_VAR,
        "BACKOFFICE_DATABASE__BACKEND",
        "BACKOFFICE_DATABASE__URL",
        "BACKOFFICE_PAGINATION__MAX_PAGE_SIZE",
        "BACKOFFICE_PAGINATION__DEFAULT_PAGE_SIZE",
    ];

    /// Runs `f` with exactly `vars` set among the variables this crate
    /// reads, restoring the previous values afterwards.
    fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved: Vec<_> = SERVICE_VARS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect();

        unsafe {
            for key in SERVICE_VARS {
                std::env::remove_var(key);
            }
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }

        let result = f();

        unsafe {
            for (key, value) in saved {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
        result
    }

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_env_vars_select_backend_and_pagination() {
        let dir = config_dir(&[("default.toml", "[pagination]\nmax_page_size = 100\n")]);

        let settings = with_env(
            &[
                ("BACKOFFICE_DATABASE__BACKEND", "postgres"),
                ("BACKOFFICE_DATABASE__URL", "postgres://app@db/backoffice"),
                ("BACKOFFICE_PAGINATION__MAX_PAGE_SIZE", "25"),
                ("BACKOFFICE_PAGINATION__DEFAULT_PAGE_SIZE", "5"),
            ],
            || {
                ConfigLoader::new()
                    .unwrap()
                    .with_config_dir(dir.path())
                    .load()
            },
        )
        .unwrap();

        assert_eq!(settings.database.backend, StorageBackend::Postgres);
        assert_eq!(settings.database.url, "postgres://app@db/backoffice");
        assert_eq!(settings.pagination.max_page_size, 25);
        assert_eq!(settings.pagination.default_page_size, 5);
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let dir = config_dir(&[("default.toml", "[database]\nbackend = \"postgres\"\n")]);
        let result = with_env(&[], || {
            ConfigLoader::new()
                .unwrap()
                .with_config_dir(dir.path())
                .load()
        });
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError { ref field, .. }) if field == "database.url"
        ));

        let dir = config_dir(&[("default.toml", "[database]\nbackend = \"sqlite\"\n")]);
        let result = with_env(&[], || {
            ConfigLoader::new()
                .unwrap()
                .with_config_dir(dir.path())
                .load()
        });
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_layers_apply_in_priority_order() {
        let dir = config_dir(&[
            ("default.toml", "[server]\nport = 3000\nhost = \"0.0.0.0\"\n"),
            ("staging.toml", "[server]\nport = 4000\n"),
            ("local.toml", "[pagination]\ndefault_page_size = 20\n"),
        ]);

        let settings = with_env(&[(AppEnvironment::ENV_VAR, "staging")], || {
            ConfigLoader::new()
                .unwrap()
                .with_config_dir(dir.path())
                .load()
        })
        .unwrap();

        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.pagination.default_page_size, 20);

        let settings = with_env(&[], || {
            ConfigLoader::new()
                .unwrap()
                .with_config_dir(dir.path())
                .with_environment(AppEnvironment::Production)
                .load()
        })
        .unwrap();
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_single_file_skips_layers() {
        let dir = config_dir(&[
            ("default.toml", "[server]\nport = 3000\n"),
            ("only.toml", "[server]\nport = 5000\n"),
        ]);
        let only = dir.path().join("only.toml");

        let loader = with_env(&[(CONFIG_FILE_ENV, only.to_str().unwrap())], || {
            ConfigLoader::new().unwrap()
        });
        assert_eq!(loader.files(), vec![(only.clone(), true)]);

        let settings = with_env(&[], || loader.load()).unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn test_missing_default_file() {
        let dir = TempDir::new().unwrap();
        let result = with_env(&[], || {
            ConfigLoader::new()
                .unwrap()
                .with_config_dir(dir.path())
                .load()
        });
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_dir_and_file_are_mutually_exclusive() {
        let result = with_env(
            &[(CONFIG_DIR_ENV, "config"), (CONFIG_FILE_ENV, "app.toml")],
            ConfigLoader::new,
        );
        assert!(matches!(
            result,
            Err(ConfigError::MutualExclusivityError(_))
        ));
    }

    #[test]
    fn test_shipped_config_directory_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let settings = with_env(&[], || {
            ConfigLoader::new().unwrap().with_config_dir(&dir).load()
        })
        .unwrap();
        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.pagination.max_page_size, 100);
    }
}
