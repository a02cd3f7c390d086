//! HTTP Middleware
//!
//! 传输层错误日志：只关心 HTTP 状态码。
//! 业务错误（errno != 0）走 HTTP 200，由 `ApiError::into_response` 记录。

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// 超过该耗时的请求记一条 warn（标注受理、合成提交都应很快返回）
const SLOW_REQUEST_MS: u128 = 2_000;

pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(%method, %uri, status = status.as_u16(), elapsed_ms, "HTTP server error");
    } else if status.is_client_error() {
        tracing::warn!(%method, %uri, status = status.as_u16(), elapsed_ms, "HTTP client error");
    } else if elapsed_ms > SLOW_REQUEST_MS && !status.is_informational() {
        // 101 为 WebSocket 升级，耗时无意义
        tracing::warn!(%method, %uri, elapsed_ms, "Slow HTTP request");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/rejected", get(|| async { StatusCode::UNPROCESSABLE_ENTITY }))
            .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_statuses_pass_through_unchanged() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
        assert_eq!(status_of("/rejected").await, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of("/broken").await, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unrouted_path_is_not_rewritten() {
        assert_eq!(status_of("/api/session/missing").await, StatusCode::NOT_FOUND);
    }
}
