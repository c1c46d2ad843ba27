//! User CRUD request handlers.
//!
//! Routes (nested under `/api/v1/users`):
//! - `GET /?q=page`          - Query a page of users
//! - `POST /`                - Create a user
//! - `DELETE /?batch=a,b`    - Delete several users
//! - `GET /{id}`             - Get a user
//! - `PUT /{id}`             - Update a user
//! - `DELETE /{id}`          - Delete a user
//! - `PATCH /{id}/enable`    - Enable a user
//! - `PATCH /{id}/disable`   - Disable a user

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    BatchDeleteQuery, CreateUserRequest, ErrorResponse, NewItemResponse, PagedResponse,
    StatusResponse, UpdateUserRequest, UserListQuery, UserResponse,
};
use crate::context::RequestContext;
use crate::error::AppResult;
use crate::models::UserStatus;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Creates user-related routes.
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(query_users, create_user, delete_users))
        .routes(routes!(get_user, update_user, delete_user))
        .routes(routes!(enable_user))
        .routes(routes!(disable_user))
}

/// GET /api/v1/users?q=page - Query a page of users
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    params(UserListQuery),
    responses(
        (status = 200, description = "One page of matching users", body = PagedResponse<UserResponse>),
        (status = 400, description = "Unknown query type or invalid filter", body = ErrorResponse)
    )
)]
async fn query_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> AppResult<Json<PagedResponse<UserResponse>>> {
    let (filter, page) = query.into_parts(state.settings.pagination.default_page_size)?;
    let (users, total) = state.services.users.query_page(&ctx, &filter, page).await?;
    let list = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(PagedResponse::new(list, page, total)))
}

/// POST /api/v1/users - Create a user
#[utoipa::path(
    post,
    path = "/",
    tag = USER_TAG,
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = NewItemResponse),
        (status = 400, description = "Invalid request or user name in use", body = ErrorResponse),
        (status = 409, description = "User name taken by a concurrent request", body = ErrorResponse)
    )
)]
async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<NewItemResponse>)> {
    let user = state.services.users.create(&ctx, req.into_new_user()).await?;
    Ok((
        StatusCode::CREATED,
        Json(NewItemResponse {
            record_id: user.record_id,
        }),
    ))
}

/// DELETE /api/v1/users?batch=a,b,c - Delete several users in order
///
/// Stops at the first id that fails; earlier deletions are kept.
#[utoipa::path(
    delete,
    path = "/",
    tag = USER_TAG,
    params(BatchDeleteQuery),
    responses(
        (status = 200, description = "All users deleted", body = StatusResponse),
        (status = 400, description = "No ids given", body = ErrorResponse),
        (status = 404, description = "An id does not exist", body = ErrorResponse)
    )
)]
async fn delete_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedQuery(query): ValidatedQuery<BatchDeleteQuery>,
) -> AppResult<Json<StatusResponse>> {
    state.services.users.delete_many(&ctx, &query.ids()).await?;
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/v1/users/{id} - Get a user
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get(&ctx, &id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/v1/users/{id} - Update a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = StatusResponse),
        (status = 400, description = "Invalid request or user name in use", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<StatusResponse>> {
    state
        .services
        .users
        .update(&ctx, &id, req.into_changes())
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// DELETE /api/v1/users/{id} - Delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = StatusResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    state.services.users.delete(&ctx, &id).await?;
    Ok(Json(StatusResponse::ok()))
}

/// PATCH /api/v1/users/{id}/enable - Enable a user
#[utoipa::path(
    patch,
    path = "/{id}/enable",
    tag = USER_TAG,
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "User enabled", body = StatusResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn enable_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    state
        .services
        .users
        .update_status(&ctx, &id, UserStatus::Enabled)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

/// PATCH /api/v1/users/{id}/disable - Disable a user
#[utoipa::path(
    patch,
    path = "/{id}/disable",
    tag = USER_TAG,
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "User disabled", body = StatusResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn disable_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<StatusResponse>> {
    state
        .services
        .users
        .update_status(&ctx, &id, UserStatus::Disabled)
        .await?;
    Ok(Json(StatusResponse::ok()))
}
