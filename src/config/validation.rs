//! Semantic checks that serde cannot express.
//!
//! Run once after loading and again after CLI overrides are merged.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, PaginationConfig, ServerConfig, Settings, StorageBackend,
};

fn ensure(ok: bool, field: &str, message: impl Into<String>) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::validation(field, message))
    }
}

impl Settings {
    /// Returns the first failing section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.pagination.validate()?;
        self.logger
            .validate()
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.port != 0, "server.port", "port must be between 1 and 65535")?;
        ensure(
            self.request_timeout > 0,
            "server.request_timeout",
            "request timeout must be at least one second",
        )
    }
}

impl DatabaseConfig {
    /// Connection settings are only checked for the postgres backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Memory {
            return Ok(());
        }

        ensure(
            !self.url.is_empty(),
            "database.url",
            "a connection URL is required for the postgres backend",
        )?;
        ensure(
            self.url.starts_with("postgres://") || self.url.starts_with("postgresql://"),
            "database.url",
            "expected postgres://[user[:password]@]host[:port]/database",
        )?;
        ensure(
            self.max_connections > 0,
            "database.max_connections",
            "must be greater than 0",
        )?;
        ensure(
            (1..=self.max_connections).contains(&self.min_connections),
            "database.min_connections",
            format!("must be between 1 and max_connections ({})", self.max_connections),
        )?;
        ensure(
            self.connection_timeout > 0,
            "database.connection_timeout",
            "must be at least one second",
        )
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.max_page_size > 0,
            "pagination.max_page_size",
            "must be greater than 0",
        )?;
        ensure(
            (1..=self.max_page_size).contains(&self.default_page_size),
            "pagination.default_page_size",
            format!("must be between 1 and max_page_size ({})", self.max_page_size),
        )
    }
}
