//! WebSocket Handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::domain::performance::SessionId;
use crate::infrastructure::http::state::AppState;

/// Session WebSocket 连接处理（标注进度与合成事件）
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<SessionId>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

async fn handle_session_socket(socket: WebSocket, session_id: SessionId, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 验证会话存在
    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    let mut event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "WebSocket connected");

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %session_id, skipped, "WebSocket lagged");
                    continue;
                }
                Err(_) => break,
            };
            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
    });

    // 接收客户端消息（仅处理关闭）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    // 通道保留给同一会话的其他连接，会话关闭时才注销
    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}
