//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// 请求体上限（脚本文本 + 编辑命令）
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// HTTP 服务器
pub struct HttpServer {
    addr: String,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        Self {
            addr: config.addr(),
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        create_routes()
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router();

        info!("Starting HTTP server on {}", self.addr);

        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.router();

        info!("Starting HTTP server on {} (with graceful shutdown)", self.addr);

        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{AiAnnotator, AnnotatorSettings};
    use crate::config::AppConfig;
    use crate::infrastructure::adapters::{FakeChatClient, FsVoiceLibrary};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::state::AppDeps;
    use crate::infrastructure::memory::{InMemoryJobManager, InMemorySessionManager};
    use crate::infrastructure::persistence::SledStateStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        _dir: TempDir,
        _rx: mpsc::Receiver<String>,
    }

    fn test_app() -> TestApp {
        let dir = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let events = Arc::new(EventPublisher::new());
        let config = AppConfig::default();

        let deps = AppDeps {
            session_manager: Arc::new(InMemorySessionManager::new()),
            job_manager: Arc::new(InMemoryJobManager::new(tx)),
            state_store: Arc::new(SledStateStore::open(dir.path().join("state.sled")).unwrap()),
            voice_library: Arc::new(FsVoiceLibrary::new(dir.path().join("voices"))),
            annotator: Arc::new(AiAnnotator::new(
                Arc::new(FakeChatClient::new()),
                events.clone(),
                AnnotatorSettings::default(),
            )),
            event_publisher: events,
            session_defaults: config.session_defaults(),
            emotion_weight: 0.65,
            audio_dir: dir.path().join("audio"),
        };

        let server = HttpServer::new(&config.server, AppState::new(deps));
        TestApp {
            router: server.router(),
            _dir: dir,
            _rx: rx,
        }
    }

    async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app();
        let (status, body) = call(&app.router, Method::GET, "/api/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "rolecast");
    }

    #[tokio::test]
    async fn test_create_then_get_session() {
        let app = test_app();
        let (status, created) = call(
            &app.router,
            Method::POST,
            "/api/session/create",
            Some(json!({"text": "他说：“你好。”\n天黑了。", "mode": "intelligent"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["errno"], 0);
        let session_id = created["data"]["session_id"].clone();
        assert!(!created["data"]["segments"].as_array().unwrap().is_empty());

        let (_, view) = call(
            &app.router,
            Method::POST,
            "/api/session/get",
            Some(json!({ "session_id": session_id })),
        )
        .await;
        assert_eq!(view["errno"], 0);
        assert_eq!(view["data"]["version"], created["data"]["version"]);
        assert_eq!(
            view["data"]["lines"].as_array().unwrap().len(),
            created["data"]["segments"].as_array().unwrap().len()
        );
    }

    #[tokio::test]
    async fn test_unknown_session_reports_errno() {
        let app = test_app();
        let (status, body) = call(
            &app.router,
            Method::POST,
            "/api/session/get",
            Some(json!({ "session_id": "00000000-0000-0000-0000-000000000000" })),
        )
        .await;
        // 业务错误仍是 HTTP 200
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_stale_version_edit_conflicts() {
        let app = test_app();
        let (_, created) = call(
            &app.router,
            Method::POST,
            "/api/session/create",
            Some(json!({"text": "第一句。第二句。", "mode": "punctuation"})),
        )
        .await;
        let session_id = created["data"]["session_id"].clone();
        let version = created["data"]["version"].as_u64().unwrap();

        let (_, edited) = call(
            &app.router,
            Method::POST,
            "/api/session/edit",
            Some(json!({
                "session_id": session_id,
                "expected_version": version,
                "edit": {"type": "delete", "index": 0}
            })),
        )
        .await;
        assert_eq!(edited["errno"], 0);

        let (_, stale) = call(
            &app.router,
            Method::POST,
            "/api/session/edit",
            Some(json!({
                "session_id": session_id,
                "expected_version": version,
                "edit": {"type": "delete", "index": 0}
            })),
        )
        .await;
        assert_eq!(stale["errno"], 409);
    }
}
