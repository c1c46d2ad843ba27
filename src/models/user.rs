//! User domain model and its persisted row shapes.

use diesel::prelude::*;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

// ============================================================================
// Status
// ============================================================================

/// Account status. Serialized as its numeric code (`1` / `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum UserStatus {
    #[default]
    Enabled,
    Disabled,
}

impl UserStatus {
    pub const fn code(self) -> i16 {
        match self {
            UserStatus::Enabled => 1,
            UserStatus::Disabled => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Enabled => "enabled",
            UserStatus::Disabled => "disabled",
        }
    }
}

impl From<UserStatus> for i16 {
    fn from(status: UserStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i16> for UserStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(UserStatus::Enabled),
            2 => Ok(UserStatus::Disabled),
            other => Err(format!(
                "Invalid user status {}. Valid values are: 1 (enabled), 2 (disabled)",
                other
            )),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Domain types
// ============================================================================

/// A live administrative account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub record_id: String,
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
    pub status: UserStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Caller-supplied fields for a new account. `record_id` and timestamps are
/// assigned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
    pub status: Option<UserStatus>,
}

/// Replacement values for the mutable attributes of an account.
///
/// Status is deliberately absent; it only changes through
/// `UserService::update_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges {
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
}

/// Search criteria. Every `Some` field narrows the result; `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Substring of the user name
    pub user_name: Option<String>,
    /// Substring of the real name
    pub real_name: Option<String>,
    /// Exact role reference
    pub role_id: Option<String>,
    pub status: Option<UserStatus>,
}

impl UserFilter {
    /// In-process evaluation of the filter, used by the memory store.
    pub fn matches(&self, user: &User) -> bool {
        self.user_name
            .as_deref()
            .is_none_or(|needle| user.user_name.contains(needle))
            && self
                .real_name
                .as_deref()
                .is_none_or(|needle| user.real_name.contains(needle))
            && self.role_id.as_deref().is_none_or(|role| user.role_id == role)
            && self.status.is_none_or(|status| user.status == status)
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub current: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(current: u32, page_size: u32) -> Self {
        Self { current, page_size }
    }

    /// Rejects page windows outside `1..` and `1..=max_page_size`.
    pub fn validate(&self, max_page_size: u32) -> AppResult<()> {
        if self.current < 1 {
            return Err(AppError::validation("current", "Page index must be at least 1"));
        }
        if self.page_size < 1 || self.page_size > max_page_size {
            return Err(AppError::validation(
                "pageSize",
                format!("Page size must be between 1 and {}", max_page_size),
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.current) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

// ============================================================================
// Persisted rows
// ============================================================================

/// Row shape for SELECT on `users` (the tombstone column is never read back).
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub record_id: String,
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
    pub status: i16,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = UserStatus::try_from(row.status).map_err(|reason| AppError::Internal {
            source: anyhow::anyhow!("corrupt users row {}: {}", row.record_id, reason),
        })?;
        Ok(User {
            record_id: row.record_id,
            user_name: row.user_name,
            real_name: row.real_name,
            role_id: row.role_id,
            status,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        })
    }
}

/// Row shape for INSERT on `users`.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUserRow {
    pub record_id: String,
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
    pub status: i16,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

impl From<&User> for NewUserRow {
    fn from(user: &User) -> Self {
        Self {
            record_id: user.record_id.clone(),
            user_name: user.user_name.clone(),
            real_name: user.real_name.clone(),
            role_id: user.role_id.clone(),
            status: user.status.code(),
            created_at: user.created_at.into(),
            updated_at: user.updated_at.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(user_name: &str, real_name: &str, role_id: &str, status: UserStatus) -> User {
        let now = Timestamp::now();
        User {
            record_id: uuid::Uuid::new_v4().to_string(),
            user_name: user_name.to_string(),
            real_name: real_name.to_string(),
            role_id: role_id.to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UserStatus::Enabled.code(), 1);
        assert_eq!(UserStatus::Disabled.code(), 2);
        assert_eq!(UserStatus::try_from(1), Ok(UserStatus::Enabled));
        assert_eq!(UserStatus::try_from(2), Ok(UserStatus::Disabled));
        assert!(UserStatus::try_from(0).is_err());
        assert!(UserStatus::try_from(3).is_err());
        assert_eq!(UserStatus::default(), UserStatus::Enabled);
    }

    #[test]
    fn test_status_serializes_as_number() {
        assert_eq!(serde_json::to_string(&UserStatus::Disabled).unwrap(), "2");
        let parsed: UserStatus = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, UserStatus::Enabled);
        assert!(serde_json::from_str::<UserStatus>("7").is_err());
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let user = sample("alice", "Alice Liddell", "admin", UserStatus::Disabled);
        assert!(UserFilter::default().matches(&user));
    }

    #[test]
    fn test_filter_fields_are_and_combined() {
        let user = sample("alice", "Alice Liddell", "admin", UserStatus::Enabled);

        let filter = UserFilter {
            user_name: Some("lic".to_string()),
            role_id: Some("admin".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&user));

        let filter = UserFilter {
            user_name: Some("lic".to_string()),
            status: Some(UserStatus::Disabled),
            ..Default::default()
        };
        assert!(!filter.matches(&user));
    }

    #[test]
    fn test_role_is_exact_and_names_are_substrings() {
        let user = sample("alice", "Alice Liddell", "admin", UserStatus::Enabled);

        let partial_role = UserFilter {
            role_id: Some("adm".to_string()),
            ..Default::default()
        };
        assert!(!partial_role.matches(&user));

        let partial_real_name = UserFilter {
            real_name: Some("Liddell".to_string()),
            ..Default::default()
        };
        assert!(partial_real_name.matches(&user));
    }

    #[test]
    fn test_page_request_window() {
        let page = PageRequest::new(3, 20);
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(1, 1).validate(100).is_ok());
        assert!(PageRequest::new(1, 100).validate(100).is_ok());
        assert!(PageRequest::new(0, 10).validate(100).is_err());
        assert!(PageRequest::new(1, 0).validate(100).is_err());
        assert!(PageRequest::new(1, 101).validate(100).is_err());
    }
}
