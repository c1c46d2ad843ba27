//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user` - User-related request/response DTOs
//! - `error` - Common error response DTOs
//! - `health` - Health check DTOs
//! - `pagination` - Pagination-related DTOs

mod error;
mod health;
mod pagination;
mod user;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::{PagedResponse, PaginationMeta};
pub use user::{
    BatchDeleteQuery, CreateUserRequest, NewItemResponse, StatusResponse, UpdateUserRequest,
    UserListQuery, UserResponse,
};
