//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Includes status code mapping, error message sanitization,
//! and request ID stamping for correlation.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::RequestId;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Builds the sanitized body for `error`. Sources of internal errors are
/// logged, never returned.
fn error_body(error: &AppError) -> ErrorResponse {
    match error {
        AppError::NotFound { entity, field, value } => {
            ErrorResponse::not_found_error(entity, field, value)
        }
        AppError::Duplicate { entity, field, value } => {
            ErrorResponse::duplicate_error(entity, field, value)
        }
        AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
        AppError::ValidationErrors { errors } => {
            let details: Vec<_> = errors
                .iter()
                .map(|e| json!({ "field": e.field, "message": e.message }))
                .collect();
            ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(json!({ "errors": details }))
        }
        AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
        AppError::Cancelled { operation } => {
            ErrorResponse::new("REQUEST_TIMEOUT", "Request cancelled before completion")
                .with_details(json!({ "operation": operation }))
        }
        AppError::Database { operation, .. } => ErrorResponse::new(
            "DATABASE_ERROR",
            &format!("Database operation failed: {}", operation),
        )
        .with_details(json!({ "operation": operation })),
        AppError::Configuration { key, .. } => {
            ErrorResponse::new("CONFIGURATION_ERROR", &format!("Configuration error: {}", key))
                .with_details(json!({ "key": key }))
        }
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
        }
        AppError::Internal { .. } => ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
    }
}

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - Validation, ValidationErrors, BadRequest → 400 BAD_REQUEST
    /// - NotFound → 404 NOT_FOUND
    /// - Duplicate → 409 CONFLICT
    /// - Cancelled → 408 REQUEST_TIMEOUT
    /// - Database, Configuration, Internal → 500 INTERNAL_SERVER_ERROR
    /// - ConnectionPool → 503 SERVICE_UNAVAILABLE
    ///
    /// The body is also stored in the response extensions so that
    /// [`global_error_handler`] can stamp the request id on it.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(kind = self.kind().as_str(), error = ?self, "Request failed");
        } else {
            tracing::debug!(kind = self.kind().as_str(), error = %self, "Request rejected");
        }

        let body = error_body(&self);
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Cancelled { .. } => StatusCode::REQUEST_TIMEOUT,
        AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Default body for error statuses produced outside our handlers
/// (unknown routes, wrong methods, framework rejections).
fn fallback_body(status: StatusCode, original_message: String) -> ErrorResponse {
    let (code, default_message) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request - invalid or malformed request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => (
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        ),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::REQUEST_TIMEOUT => ("REQUEST_TIMEOUT", "Request timeout"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::SERVICE_UNAVAILABLE => {
            ("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
        }
        s if s.is_server_error() => ("INTERNAL_SERVER_ERROR", "An internal server error occurred"),
        _ => ("UNKNOWN_ERROR", "An unknown error occurred"),
    };

    // Server error bodies are never echoed back.
    let message = if original_message.is_empty() || status.is_server_error() {
        default_message.to_string()
    } else {
        original_message
    };
    ErrorResponse::new(code, &message)
}

/// Global error handling middleware.
///
/// Every 4xx/5xx response leaves in the standard [`ErrorResponse`] shape with
/// the request id attached. Bodies produced by [`AppError`] are reused; other
/// error bodies are wrapped. Successful responses pass through untouched.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let request_id = request.extensions().get::<RequestId>().cloned();
    let response = next.run(request).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, original) = response.into_parts();
    let body = match parts.extensions.remove::<ErrorResponse>() {
        Some(body) => body,
        None => {
            let is_json = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("application/json"));
            if is_json {
                return Response::from_parts(parts, original);
            }

            let bytes = axum::body::to_bytes(original, 64 * 1024)
                .await
                .unwrap_or_default();
            fallback_body(status, String::from_utf8_lossy(&bytes).trim().to_string())
        }
    };

    let body = match &request_id {
        Some(id) => body.with_request_id(id.as_str()),
        None => body,
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    match serde_json::to_vec(&body) {
        Ok(bytes) => Response::from_parts(parts, Body::from(bytes)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error response");
            Response::from_parts(parts, Body::empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_and_code_mapping() {
        let cases = [
            (AppError::user_not_found("1"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Duplicate {
                    entity: "users".into(),
                    field: "user_name".into(),
                    value: "alice".into(),
                },
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
            ),
            (
                AppError::validation("user_name", "empty"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AppError::ValidationErrors { errors: vec![] },
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (AppError::bad_request("nope"), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (
                AppError::Cancelled {
                    operation: "create user".into(),
                },
                StatusCode::REQUEST_TIMEOUT,
                "REQUEST_TIMEOUT",
            ),
            (
                AppError::Database {
                    operation: "insert user".into(),
                    source: anyhow::anyhow!("Connection failed"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
            (
                AppError::Configuration {
                    key: "database.url".into(),
                    source: anyhow::anyhow!("Missing config"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("Pool exhausted"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                AppError::Internal {
                    source: anyhow::anyhow!("boom"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            assert_eq!(error_to_status_code(&error), status, "{:?}", error);
            assert_eq!(error_body(&error).code, code, "{:?}", error);
        }
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let error = AppError::Internal {
            source: anyhow::anyhow!("stack trace with secret"),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("secret"));
    }

    #[tokio::test]
    async fn test_validation_errors_listed_in_details() {
        let error = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "user_name".into(),
                message: "too long".into(),
            }],
        };
        let body = body_of(error.into_response()).await;
        assert_eq!(body.details.unwrap()["errors"][0]["field"], "user_name");
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/missing",
                get(|| async { AppError::user_not_found("abc") }),
            )
            .route(
                "/plain",
                get(|| async { (StatusCode::BAD_REQUEST, "plain failure") }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(global_error_handler))
    }

    fn request(uri: &str) -> Request {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(RequestId("req-42".to_string()));
        request
    }

    #[tokio::test]
    async fn test_app_error_gets_request_id() {
        let response = app().oneshot(request("/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_of(response).await;
        assert_eq!(body.code, "NOT_FOUND");
        assert_eq!(body.request_id.as_deref(), Some("req-42"));
    }

    #[tokio::test]
    async fn test_plain_error_body_is_wrapped() {
        let response = app().oneshot(request("/plain")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = body_of(response).await;
        assert_eq!(body.code, "BAD_REQUEST");
        assert_eq!(body.message, "plain failure");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app().oneshot(request("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
