//! Typed view of the merged configuration.
//!
//! Every section is `#[serde(default)]`, so a file only needs to name the
//! keys it changes. The `[logger]` section deserializes straight into
//! [`LoggerConfig`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logger::LoggerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub application: ApplicationConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logger: LoggerConfig,
    pub pagination: PaginationConfig,
}

/// Name and version reported by `/health` and the startup log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: crate::pkg_version().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds before a request's cancellation token fires
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port`, as passed to the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Which `UserStore` implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local; contents are lost on shutdown
    #[default]
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Only read by the postgres backend
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    /// Run pending migrations before the server binds
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout: 30,
            auto_migrate: false,
        }
    }
}

/// Bounds applied to list requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Used when a request omits `pageSize`
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogFormat;

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.application.name, "backoffice-rs");
        assert_eq!(settings.database.backend, StorageBackend::Memory);
        assert_eq!(settings.pagination.default_page_size, 10);
        assert_eq!(settings.pagination.max_page_size, 100);
        assert_eq!(settings.server.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 8088

            [database]
            backend = "postgres"
            url = "postgres://localhost/backoffice"

            [logger]
            level = "debug"

            [logger.file]
            enabled = true
            format = "full"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.request_timeout_duration(), Duration::from_secs(30));
        assert_eq!(settings.database.backend, StorageBackend::Postgres);
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.logger.level, "debug");
        assert!(settings.logger.console.enabled);
        assert_eq!(settings.logger.file.format, LogFormat::Full);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let parsed = toml::from_str::<Settings>("[database]\nbackend = \"sqlite\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_backend_display_matches_serde_name() {
        for backend in [StorageBackend::Postgres, StorageBackend::Memory] {
            let encoded = toml::to_string(&DatabaseConfig {
                backend,
                ..Default::default()
            })
            .unwrap();
            assert!(encoded.contains(&format!("backend = \"{backend}\"")));
        }
    }
}
