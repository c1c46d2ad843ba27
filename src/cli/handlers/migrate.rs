//! Migrate command handler
//!
//! Applies, previews or reverts the embedded schema migrations against
//! `database.url`.

use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::db::{pending_migrations, revert_migrations, run_pending_migrations};
use crate::error::{AppError, AppResult};

/// Handler for the migrate command
pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the migrate command with dry-run and rollback support
    ///
    /// # Errors
    /// - `Validation` when no PostgreSQL URL is configured or `rollback` is 0
    /// - `Database` for connection and migration failures
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if rollback == Some(0) {
            return Err(AppError::validation(
                "rollback_steps",
                "Number of rollback steps must be greater than 0",
            ));
        }
        self.validate_database()?;

        let url = &self.config.database.url;
        if dry_run {
            let pending = pending_migrations(url).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations found - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("\nRun without --dry-run to apply these migrations");
            }
            return Ok(());
        }

        if let Some(steps) = rollback {
            println!("Rolling back {} migration(s)...", steps);
            let reverted = revert_migrations(url, steps).await?;
            for version in &reverted {
                println!("  - {}", version);
            }
            println!("✓ Rolled back {} migration(s)", reverted.len());
            tracing::info!(steps = reverted.len(), "Migrations reverted");
            return Ok(());
        }

        println!("Running database migrations...");
        let applied = run_pending_migrations(url).await?;
        if applied.is_empty() {
            println!("✓ No migrations to apply - database is already up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {}", version);
            }
        }
        tracing::info!(applied = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Migrations always target PostgreSQL, even when the server is
    /// configured for the memory backend.
    fn validate_database(&self) -> AppResult<()> {
        let mut database = self.config.database.clone();
        database.backend = StorageBackend::Postgres;
        database.validate()?;
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
