//! Annotation Commands - AI 标注命令

use serde::Serialize;

use crate::domain::performance::SessionId;

/// AI 标注命令
#[derive(Debug, Clone)]
pub struct AnnotateSessionCommand {
    pub session_id: SessionId,
}

/// 标注已受理（异步执行，结果通过 WebSocket 推送）
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationAccepted {
    pub session_id: SessionId,
    /// 开始标注时的会话版本
    pub base_version: u64,
    pub lines: usize,
}

/// 标注完成
#[derive(Debug, Clone, Serialize)]
pub struct AnnotateSessionResponse {
    pub session_id: SessionId,
    pub version: u64,
    pub segments: usize,
    pub roles: Vec<String>,
    pub heuristic_batches: usize,
}
