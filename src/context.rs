//! Per-request context threaded through every service operation.

use std::future::Future;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

/// Request id plus the cancellation token governing one logical operation.
///
/// Cloning is cheap and clones share the same token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    token: CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self::with_token(request_id, CancellationToken::new())
    }

    pub fn with_token(request_id: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            request_id: request_id.into(),
            token,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Drive `fut` unless the token fires first.
    ///
    /// Cancellation is checked before the future is polled, so a context that
    /// is already cancelled never starts the operation.
    pub async fn run<T, F>(&self, operation: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!(request_id = %self.request_id, operation, "operation cancelled");
                Err(AppError::Cancelled {
                    operation: operation.to_string(),
                })
            }
            result = fut => result,
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }

        // Routers mounted without the context middleware still get a usable,
        // never-cancelled context.
        let request_id = parts
            .extensions
            .get::<crate::api::middleware::RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(RequestContext::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_returns_operation_result() {
        let ctx = RequestContext::new("req-1");
        let value = ctx.run("answer", async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_cancelled_context_never_polls_the_operation() {
        let ctx = RequestContext::new("req-2");
        ctx.cancel();

        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let result = ctx
            .run("write", async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Cancelled { operation }) if operation == "write"));
        assert!(!started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_in_flight_operation_is_abandoned_on_cancel() {
        let ctx = RequestContext::new("req-3");
        let token = ctx.cancellation_token().clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result: AppResult<()> = ctx
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Cancelled { .. })));
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_clones_share_the_token() {
        let ctx = RequestContext::new("req-4");
        let clone = ctx.clone();
        clone.cancel();
        assert!(ctx.is_cancelled());
        assert_eq!(clone.request_id(), "req-4");
    }
}
