//! Chat Completion Port - 对话模型抽象
//!
//! AI 标注通过此端口调用外部对话模型，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// 对话模型错误
///
/// 任何一种都会让本次标注整体放弃，会话保持原状
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service returned HTTP {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// 单条消息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// 对话请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// 以下两个参数原样透传给模型
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat Completion Port
#[async_trait]
pub trait ChatCompletionPort: Send + Sync {
    /// 发送一次对话请求，返回模型回复的原始文本
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatError>;
}
