//! User repository for async database operations.
//!
//! Provides the PostgreSQL [`UserStore`] using diesel_async.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{NewUserRow, User, UserChanges, UserFilter, UserRow, UserStatus};
use crate::repositories::UserStore;
use crate::schema::users;

/// User repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap
/// (just reference count increment).
#[derive(Clone)]
pub struct PgUserRepository {
    pool: AsyncDbPool,
}

impl PgUserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Live rows matching `filter`, boxed so optional predicates can be chained.
    fn filtered(filter: &UserFilter) -> users::BoxedQuery<'static, Pg> {
        let mut query = users::table
            .filter(users::deleted_at.is_null())
            .into_boxed();

        if let Some(name) = &filter.user_name {
            query = query.filter(users::user_name.like(contains_pattern(name)));
        }
        if let Some(name) = &filter.real_name {
            query = query.filter(users::real_name.like(contains_pattern(name)));
        }
        if let Some(role) = &filter.role_id {
            query = query.filter(users::role_id.eq(role.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(users::status.eq(status.code()));
        }

        query
    }

    fn to_users(rows: Vec<UserRow>) -> AppResult<Vec<User>> {
        rows.into_iter().map(User::try_from).collect()
    }
}

/// `%needle%` with LIKE metacharacters escaped (`\` is PostgreSQL's default
/// LIKE escape character).
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn db_error(operation: &str) -> impl FnOnce(diesel::result::Error) -> AppError + '_ {
    move |e| DatabaseErrorConverter::convert_diesel_error(e, operation)
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn query(&self, filter: &UserFilter, offset: i64, limit: i64) -> AppResult<Vec<User>> {
        let mut conn = self.pool.get().await?;

        let rows = Self::filtered(filter)
            .order((users::created_at.desc(), users::record_id.desc()))
            .offset(offset)
            .limit(limit)
            .select(UserRow::as_select())
            .load::<UserRow>(&mut conn)
            .await
            .map_err(db_error("query users"))?;

        Self::to_users(rows)
    }

    async fn count(&self, filter: &UserFilter) -> AppResult<i64> {
        let mut conn = self.pool.get().await?;

        Self::filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(db_error("count users"))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::record_id.eq(id))
            .filter(users::deleted_at.is_null())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(db_error("find user by id"))?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_user_name(&self, user_name: &str) -> AppResult<Option<User>> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::user_name.eq(user_name))
            .filter(users::deleted_at.is_null())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(db_error("find user by name"))?
            .map(User::try_from)
            .transpose()
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(users::table)
            .values(NewUserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(db_error("insert user"))?;
        Ok(())
    }

    async fn update(&self, id: &str, changes: &UserChanges, at: Timestamp) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::update(
            users::table
                .filter(users::record_id.eq(id))
                .filter(users::deleted_at.is_null()),
        )
        .set((changes, users::updated_at.eq(jiff_diesel::Timestamp::from(at))))
        .execute(&mut conn)
        .await
        .map_err(db_error("update user"))
    }

    async fn update_status(
        &self,
        id: &str,
        status: UserStatus,
        at: Timestamp,
    ) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;

        diesel::update(
            users::table
                .filter(users::record_id.eq(id))
                .filter(users::deleted_at.is_null()),
        )
        .set((
            users::status.eq(status.code()),
            users::updated_at.eq(jiff_diesel::Timestamp::from(at)),
        ))
        .execute(&mut conn)
        .await
        .map_err(db_error("update user status"))
    }

    async fn soft_delete(&self, id: &str, at: Timestamp) -> AppResult<usize> {
        let mut conn = self.pool.get().await?;
        let at = jiff_diesel::Timestamp::from(at);

        diesel::update(
            users::table
                .filter(users::record_id.eq(id))
                .filter(users::deleted_at.is_null()),
        )
        .set((users::deleted_at.eq(Some(at)), users::updated_at.eq(at)))
        .execute(&mut conn)
        .await
        .map_err(db_error("delete user"))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(db_error("ping database"))?;
        Ok(())
    }
}
