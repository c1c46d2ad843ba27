//! Serve command handler
//!
//! Runs the HTTP server, or only checks the configuration with `--dry-run`.

use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validate the configuration, then start the server unless `dry_run`.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        self.config.validate()?;

        if dry_run {
            self.report();
            return Ok(());
        }

        Server::new(self.config.clone()).run().await
    }

    fn report(&self) {
        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        match self.config.database.backend {
            StorageBackend::Postgres => println!(
                "✓ Storage backend: postgres (max {} connections, auto_migrate={})",
                self.config.database.max_connections, self.config.database.auto_migrate
            ),
            StorageBackend::Memory => {
                println!("✓ Storage backend: memory (data is lost on shutdown)")
            }
        }
        println!(
            "✓ Page size: default {}, max {}",
            self.config.pagination.default_page_size, self.config.pagination.max_page_size
        );
        println!("Dry run completed successfully - configuration is ready for deployment");
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_handler_dry_run() {
        let handler = ServeCommandHandler::new(Settings::default());
        assert!(handler.execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_serve_handler_dry_run_invalid_config() {
        let mut config = Settings::default();
        config.server.port = 0;
        let handler = ServeCommandHandler::new(config);

        assert!(handler.execute(true).await.is_err());
    }
}
