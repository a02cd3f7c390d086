//! Fake Chat Client - 用于测试的对话模型
//!
//! 按顺序返回预置的回复或错误，并记录每一次请求

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{ChatCompletionPort, ChatError, ChatRequest};

/// 预置回复用尽后返回的内容
const EMPTY_ANALYSIS: &str = r#"{"roles":[],"segments":[]}"#;

#[derive(Default)]
pub struct FakeChatClient {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, body: &str) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(body.to_string()));
        }
    }

    pub fn push_failure(&self, error: ChatError) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error));
        }
    }

    /// 每次回复前等待，用于模拟慢速模型
    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.delay.lock() {
            *d = Some(delay);
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatCompletionPort for FakeChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        next.unwrap_or_else(|| Ok(EMPTY_ANALYSIS.to_string()))
    }
}
