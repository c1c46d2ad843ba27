//! Database access.
//!
//! Async PostgreSQL connection pooling using diesel_async with bb8, plus the
//! embedded migrations applied by `migrate` and `database.auto_migrate`.

mod migrations;
mod pool;

pub use migrations::{MIGRATIONS, pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{AsyncDbPool, establish_async_connection_pool};
