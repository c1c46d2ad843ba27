//! User service for business logic operations.
//!
//! Owns validation, pagination and the status state machine for user
//! records. Every store call runs under the caller's [`RequestContext`], so a
//! cancelled request never starts a write.

use std::sync::Arc;

use jiff::Timestamp;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, PageRequest, User, UserChanges, UserFilter, UserStatus};
use crate::repositories::UserStore;

/// User service for handling user-related business logic.
///
/// Holds no mutable state; cloning shares the underlying store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    max_page_size: u32,
}

impl UserService {
    /// Creates a new UserService over `store`, capping page sizes at
    /// `max_page_size`.
    pub fn new(store: Arc<dyn UserStore>, max_page_size: u32) -> Self {
        Self {
            store,
            max_page_size,
        }
    }

    /// Storage reachability, used by the health endpoint.
    pub async fn ping(&self, ctx: &RequestContext) -> AppResult<()> {
        ctx.run("ping storage", self.store.ping()).await
    }

    /// Returns one page of matching users and the total number of matches.
    ///
    /// # Errors
    /// `Validation` when `current < 1` or `page_size` falls outside
    /// `1..=max_page_size`.
    pub async fn query_page(
        &self,
        ctx: &RequestContext,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)> {
        page.validate(self.max_page_size)?;

        ctx.run("query users", async {
            futures::try_join!(
                self.store.query(filter, page.offset(), page.limit()),
                self.store.count(filter),
            )
        })
        .await
    }

    /// Gets a live user by id, or `NotFound`.
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AppResult<User> {
        ctx.run("get user", self.store.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::user_not_found(id))
    }

    /// Creates a user and returns it with its assigned id and timestamps.
    ///
    /// The name pre-check reports a taken `user_name` as `Validation`; a
    /// writer that wins the race between check and insert surfaces as
    /// `Duplicate` from the store.
    pub async fn create(&self, ctx: &RequestContext, new_user: NewUser) -> AppResult<User> {
        let user_name = checked_user_name(&new_user.user_name)?;
        self.ensure_name_available(ctx, &user_name, None).await?;

        let now = Timestamp::now();
        let user = User {
            record_id: uuid::Uuid::new_v4().to_string(),
            user_name,
            real_name: new_user.real_name,
            role_id: new_user.role_id,
            status: new_user.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        ctx.run("create user", self.store.insert(&user)).await?;

        tracing::info!(
            request_id = %ctx.request_id(),
            record_id = %user.record_id,
            user_name = %user.user_name,
            "User created"
        );
        Ok(user)
    }

    /// Replaces the mutable attributes of a live user.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &str,
        changes: UserChanges,
    ) -> AppResult<()> {
        self.get(ctx, id).await?;

        let changes = UserChanges {
            user_name: checked_user_name(&changes.user_name)?,
            ..changes
        };
        self.ensure_name_available(ctx, &changes.user_name, Some(id))
            .await?;

        let rows = ctx
            .run(
                "update user",
                self.store.update(id, &changes, Timestamp::now()),
            )
            .await?;
        // Deleted between the existence check and the write
        if rows == 0 {
            return Err(AppError::user_not_found(id));
        }

        tracing::info!(request_id = %ctx.request_id(), record_id = %id, "User updated");
        Ok(())
    }

    /// Soft-deletes a live user. Deleting twice yields `NotFound`.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        let rows = ctx
            .run("delete user", self.store.soft_delete(id, Timestamp::now()))
            .await?;
        if rows == 0 {
            return Err(AppError::user_not_found(id));
        }

        tracing::info!(request_id = %ctx.request_id(), record_id = %id, "User deleted");
        Ok(())
    }

    /// Deletes `ids` in order, stopping at the first failure.
    ///
    /// Deletions that succeeded before the failure are kept.
    pub async fn delete_many(&self, ctx: &RequestContext, ids: &[String]) -> AppResult<()> {
        if ids.is_empty() {
            return Err(AppError::validation("batch", "At least one id is required"));
        }

        for (index, id) in ids.iter().enumerate() {
            if let Err(e) = self.delete(ctx, id).await {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    record_id = %id,
                    deleted = index,
                    error = %e,
                    "Batch delete stopped"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    /// Moves a user to `status`. Setting the current status again is a
    /// successful no-op.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: &str,
        status: UserStatus,
    ) -> AppResult<()> {
        let current = self.get(ctx, id).await?;
        if current.status == status {
            return Ok(());
        }

        let rows = ctx
            .run(
                "update user status",
                self.store.update_status(id, status, Timestamp::now()),
            )
            .await?;
        if rows == 0 {
            return Err(AppError::user_not_found(id));
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            record_id = %id,
            status = %status,
            "User status changed"
        );
        Ok(())
    }

    async fn ensure_name_available(
        &self,
        ctx: &RequestContext,
        user_name: &str,
        owner: Option<&str>,
    ) -> AppResult<()> {
        let holder = ctx
            .run("find user by name", self.store.find_by_user_name(user_name))
            .await?;

        match holder {
            Some(existing) if Some(existing.record_id.as_str()) != owner => Err(
                AppError::validation("user_name", format!("'{}' is already in use", user_name)),
            ),
            _ => Ok(()),
        }
    }
}

/// Stored names are exactly what the caller sent; padded input is refused.
fn checked_user_name(user_name: &str) -> AppResult<String> {
    if user_name.trim().is_empty() {
        return Err(AppError::validation("user_name", "User name must not be empty"));
    }
    if user_name.trim() != user_name {
        return Err(AppError::validation(
            "user_name",
            "User name must not start or end with whitespace",
        ));
    }
    Ok(user_name.to_string())
}
