//! User-related DTOs for API requests and responses.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, PageRequest, User, UserChanges, UserFilter, UserStatus};

/// The only list query type understood by `GET /api/v1/users`.
pub const PAGE_QUERY: &str = "page";

// ============================================================================
// Request DTOs
// ============================================================================

/// Query string of `GET /api/v1/users`.
///
/// Empty values are treated as absent, matching how form-driven clients send
/// untouched filter fields.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Query type; only `page` is supported (default `page`)
    #[param(example = "page")]
    pub q: Option<String>,
    /// Page index, 1-based (default 1)
    #[serde(default, deserialize_with = "blank_as_none")]
    #[param(minimum = 1, example = 1)]
    pub current: Option<u32>,
    /// Page size (default from configuration)
    #[serde(rename = "pageSize", default, deserialize_with = "blank_as_none")]
    #[param(minimum = 1, example = 10)]
    pub page_size: Option<u32>,
    /// User name substring
    #[validate(length(max = 64, message = "user_name filter must be at most 64 characters"))]
    pub user_name: Option<String>,
    /// Real name substring
    #[validate(length(max = 64, message = "real_name filter must be at most 64 characters"))]
    pub real_name: Option<String>,
    /// Exact role id
    #[validate(length(max = 36, message = "role_id filter must be at most 36 characters"))]
    pub role_id: Option<String>,
    /// 1 = enabled, 2 = disabled, empty or 0 = any
    #[param(example = "1")]
    pub status: Option<String>,
}

impl UserListQuery {
    /// Splits the query into the filter and the page window.
    ///
    /// # Errors
    /// `BadRequest` for an unknown `q` or an unrecognised `status`.
    pub fn into_parts(self, default_page_size: u32) -> AppResult<(UserFilter, PageRequest)> {
        match self.q.as_deref() {
            None | Some("") | Some(PAGE_QUERY) => {}
            Some(other) => {
                return Err(AppError::bad_request(format!("unknown query type '{}'", other)));
            }
        }

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("0") => None,
            Some(raw) => {
                let code = raw
                    .parse::<i16>()
                    .map_err(|_| AppError::bad_request(format!("invalid status '{}'", raw)))?;
                Some(UserStatus::try_from(code).map_err(AppError::bad_request)?)
            }
        };

        let filter = UserFilter {
            user_name: non_empty(self.user_name),
            real_name: non_empty(self.real_name),
            role_id: non_empty(self.role_id),
            status,
        };
        let page = PageRequest::new(
            self.current.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
        );
        Ok((filter, page))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `current=` and `pageSize=` fall back to their defaults like absent keys.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Query string of `DELETE /api/v1/users`.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct BatchDeleteQuery {
    /// Comma-separated record ids
    #[param(example = "id-1,id-2")]
    pub batch: Option<String>,
}

impl BatchDeleteQuery {
    /// Ids in request order; blank segments are dropped.
    pub fn ids(&self) -> Vec<String> {
        self.batch
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64, message = "user_name must be between 1 and 64 characters"))]
    #[schema(min_length = 1, max_length = 64, example = "alice")]
    pub user_name: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "real_name must be at most 64 characters"))]
    #[schema(max_length = 64, example = "Alice Liddell")]
    pub real_name: String,
    #[serde(default)]
    #[validate(length(max = 36, message = "role_id must be at most 36 characters"))]
    #[schema(max_length = 36)]
    pub role_id: String,
    /// 1 = enabled (default), 2 = disabled
    #[schema(value_type = Option<i16>, example = 1)]
    pub status: Option<UserStatus>,
}

impl CreateUserRequest {
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            user_name: self.user_name,
            real_name: self.real_name,
            role_id: self.role_id,
            status: self.status,
        }
    }
}

/// Request body for updating a user.
///
/// `record_id` and `status` are not part of the body; unknown fields are
/// ignored.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64, message = "user_name must be between 1 and 64 characters"))]
    #[schema(min_length = 1, max_length = 64)]
    pub user_name: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "real_name must be at most 64 characters"))]
    #[schema(max_length = 64)]
    pub real_name: String,
    #[serde(default)]
    #[validate(length(max = 36, message = "role_id must be at most 36 characters"))]
    #[schema(max_length = 36)]
    pub role_id: String,
}

impl UpdateUserRequest {
    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            user_name: self.user_name,
            real_name: self.real_name,
            role_id: self.role_id,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// A user as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub record_id: String,
    pub user_name: String,
    pub real_name: String,
    pub role_id: String,
    /// 1 = enabled, 2 = disabled
    #[schema(value_type = i16, example = 1)]
    pub status: UserStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            record_id: user.record_id,
            user_name: user.user_name,
            real_name: user.real_name,
            role_id: user.role_id,
            status: user.status,
            created_at: user.created_at.to_string(),
            updated_at: user.updated_at.to_string(),
        }
    }
}

/// Response of a successful create.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NewItemResponse {
    pub record_id: String,
}

/// `{"status": "OK"}` acknowledgement for mutations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "OK")]
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
        }
    }
}
