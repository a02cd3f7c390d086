//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                  GET   健康检查
//! - /api/session/create        POST  创建会话并分段
//! - /api/session/get           POST  获取会话（行、角色、统计、警告）
//! - /api/session/resegment     POST  重新分段
//! - /api/session/edit          POST  编辑（插入、删除、移动、拆分、批量操作等）
//! - /api/session/annotate      POST  AI 标注（异步，通过 WS 通知完成）
//! - /api/session/plan          POST  获取演绎计划
//! - /api/session/save          POST  保存角色表与行注解
//! - /api/session/close         POST  关闭会话
//! - /api/voice/list            GET   列出音色
//! - /api/voice/audio           POST  获取音色参考音频
//! - /api/synthesis/submit      POST  提交合成任务
//! - /api/synthesis/status      POST  查询合成任务
//! - /api/synthesis/audio/{session_id}/{index}  GET  获取片段音频
//! - /ws/session/{id}           WS    标注进度与合成事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/session", session_routes())
        .nest("/voice", voice_routes())
        .nest("/synthesis", synthesis_routes())
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_session))
        .route("/get", post(handlers::get_session))
        .route("/resegment", post(handlers::resegment))
        .route("/edit", post(handlers::edit_session))
        .route("/annotate", post(handlers::annotate_session))
        .route("/plan", post(handlers::get_plan))
        .route("/save", post(handlers::save_session))
        .route("/close", post(handlers::close_session))
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_voices))
        .route("/audio", post(handlers::voice_audio))
}

/// Synthesis 路由
fn synthesis_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit", post(handlers::submit_synthesis))
        .route("/status", post(handlers::synthesis_status))
        .route(
            "/audio/:session_id/:index",
            get(handlers::segment_audio),
        )
}
