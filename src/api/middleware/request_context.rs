//! Request-scoped cancellation.
//!
//! Attaches a [`RequestContext`] to every request. Its token is cancelled
//! when the configured request timeout elapses or when the client goes away
//! (the response future is dropped), so store calls running under the context
//! are abandoned instead of finishing for nobody.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::RequestId;
use crate::context::RequestContext;

/// Middleware installing the [`RequestContext`] and arming the timeout.
///
/// Meant for `axum::middleware::from_fn_with_state(timeout, ...)`.
pub async fn request_context_middleware(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let ctx = RequestContext::new(request_id);
    request.extensions_mut().insert(ctx.clone());

    let token = ctx.cancellation_token().clone();
    let timer_id = ctx.request_id().to_string();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    request_id = %timer_id,
                    timeout_ms = %timeout.as_millis(),
                    "Request timed out, cancelling"
                );
                token.cancel();
            }
        }
    });

    // Cancels on completion as well as on drop, which also stops the timer.
    let _guard = ctx.cancellation_token().clone().drop_guard();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn slow(ctx: RequestContext) -> AppResult<&'static str> {
        ctx.run("slow operation", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("finished")
        })
        .await
    }

    async fn echo_id(ctx: RequestContext) -> String {
        ctx.request_id().to_string()
    }

    fn app(timeout: Duration) -> Router {
        Router::new()
            .route("/slow", get(slow))
            .route("/id", get(echo_id))
            .layer(middleware::from_fn_with_state(
                timeout,
                request_context_middleware,
            ))
    }

    #[tokio::test]
    async fn test_timeout_cancels_and_answers_408() {
        let response = app(Duration::from_millis(20))
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_context_reuses_request_id() {
        let mut request = Request::builder().uri("/id").body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(RequestId("req-ctx".to_string()));

        let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "req-ctx");
    }
}
