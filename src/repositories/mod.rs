//! Repository layer for data access operations.
//!
//! [`UserStore`] is the persistence seam of the user service. Two backends
//! implement it: PostgreSQL via diesel_async and an in-process store that keeps
//! records and the live-name index behind one `RwLock`.

mod memory_user_repo;
mod user_repo;

pub use memory_user_repo::MemoryUserRepository;
pub use user_repo::PgUserRepository;

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;

use crate::config::StorageBackend;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{User, UserChanges, UserFilter, UserStatus};

/// Persistence operations for user records.
///
/// Every lookup and mutation only sees live (not soft-deleted) records.
/// Implementations enforce `user_name` uniqueness among live records and
/// report a violation as [`AppError::Duplicate`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Matching records ordered by `created_at DESC, record_id DESC`.
    async fn query(&self, filter: &UserFilter, offset: i64, limit: i64) -> AppResult<Vec<User>>;

    /// Number of matching records, ignoring pagination.
    async fn count(&self, filter: &UserFilter) -> AppResult<i64>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>>;

    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Returns the number of rows changed (0 when `id` is not live).
    async fn update(&self, id: &str, changes: &UserChanges, at: Timestamp) -> AppResult<usize>;

    async fn update_status(&self, id: &str, status: UserStatus, at: Timestamp)
    -> AppResult<usize>;

    /// Tombstones the record and releases its `user_name`.
    async fn soft_delete(&self, id: &str, at: Timestamp) -> AppResult<usize>;

    /// Cheap reachability check used by the health endpoint.
    async fn ping(&self) -> AppResult<()>;
}

/// Aggregates all repositories for convenient access.
///
/// Cloning is cheap; every store sits behind an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
}

impl Repositories {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Repositories backed by the PostgreSQL pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self::new(Arc::new(PgUserRepository::new(pool)))
    }

    /// Repositories backed by process memory.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryUserRepository::new()))
    }

    /// Picks the implementation named by `backend`; postgres requires a pool.
    pub fn for_backend(backend: StorageBackend, pool: Option<AsyncDbPool>) -> AppResult<Self> {
        match (backend, pool) {
            (StorageBackend::Memory, _) => Ok(Self::memory()),
            (StorageBackend::Postgres, Some(pool)) => Ok(Self::postgres(pool)),
            (StorageBackend::Postgres, None) => Err(AppError::Configuration {
                key: "database.backend".to_string(),
                source: anyhow::anyhow!("postgres backend selected without a connection pool"),
            }),
        }
    }
}
