//! In-process user store.
//!
//! Records and the live `user_name` index sit behind a single lock so that
//! uniqueness checks and writes are atomic with respect to each other.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::{AppError, AppResult};
use crate::models::{User, UserChanges, UserFilter, UserStatus};
use crate::repositories::UserStore;

struct StoredUser {
    user: User,
    deleted_at: Option<Timestamp>,
}

impl StoredUser {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<String, StoredUser>,
    /// live user_name -> record_id
    names: HashMap<String, String>,
}

impl MemoryState {
    fn live_mut(&mut self, id: &str) -> Option<&mut StoredUser> {
        self.records.get_mut(id).filter(|stored| stored.is_live())
    }

    fn matching<'a>(&'a self, filter: &'a UserFilter) -> impl Iterator<Item = &'a User> + 'a {
        self.records
            .values()
            .filter(|stored| stored.is_live())
            .map(|stored| &stored.user)
            .filter(move |user| filter.matches(user))
    }
}

/// User store kept entirely in process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryUserRepository {
    state: RwLock<MemoryState>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("user store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("user store lock poisoned: {}", e),
        })
    }
}

fn duplicate_name(user_name: &str) -> AppError {
    AppError::Duplicate {
        entity: "users".to_string(),
        field: "user_name".to_string(),
        value: user_name.to_string(),
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn query(&self, filter: &UserFilter, offset: i64, limit: i64) -> AppResult<Vec<User>> {
        let state = self.read()?;

        let mut users: Vec<&User> = state.matching(filter).collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.record_id.cmp(&a.record_id))
        });

        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(users
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> AppResult<i64> {
        let state = self.read()?;
        Ok(state.matching(filter).count() as i64)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .records
            .get(id)
            .filter(|stored| stored.is_live())
            .map(|stored| stored.user.clone()))
    }

    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .names
            .get(user_name)
            .and_then(|id| state.records.get(id))
            .map(|stored| stored.user.clone()))
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut state = self.write()?;

        if state.names.contains_key(&user.user_name) {
            return Err(duplicate_name(&user.user_name));
        }
        if state.records.contains_key(&user.record_id) {
            return Err(AppError::Duplicate {
                entity: "users".to_string(),
                field: "record_id".to_string(),
                value: user.record_id.clone(),
            });
        }

        state
            .names
            .insert(user.user_name.clone(), user.record_id.clone());
        state.records.insert(
            user.record_id.clone(),
            StoredUser {
                user: user.clone(),
                deleted_at: None,
            },
        );
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UserChanges, at: Timestamp) -> AppResult<usize> {
        let mut state = self.write()?;

        let Some(current_name) = state.live_mut(id).map(|stored| stored.user.user_name.clone())
        else {
            return Ok(0);
        };

        if current_name != changes.user_name {
            if state.names.contains_key(&changes.user_name) {
                return Err(duplicate_name(&changes.user_name));
            }
            state.names.remove(&current_name);
            state
                .names
                .insert(changes.user_name.clone(), id.to_string());
        }

        if let Some(stored) = state.live_mut(id) {
            stored.user.user_name = changes.user_name.clone();
            stored.user.real_name = changes.real_name.clone();
            stored.user.role_id = changes.role_id.clone();
            stored.user.updated_at = at;
        }
        Ok(1)
    }

    async fn update_status(
        &self,
        id: &str,
        status: UserStatus,
        at: Timestamp,
    ) -> AppResult<usize> {
        let mut state = self.write()?;
        match state.live_mut(id) {
            Some(stored) => {
                stored.user.status = status;
                stored.user.updated_at = at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn soft_delete(&self, id: &str, at: Timestamp) -> AppResult<usize> {
        let mut state = self.write()?;

        let Some(stored) = state.live_mut(id) else {
            return Ok(0);
        };
        stored.deleted_at = Some(at);
        stored.user.updated_at = at;
        let released = stored.user.user_name.clone();

        state.names.remove(&released);
        Ok(1)
    }

    async fn ping(&self) -> AppResult<()> {
        self.read().map(|_| ())
    }
}
