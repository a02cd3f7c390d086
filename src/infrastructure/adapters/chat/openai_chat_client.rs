//! OpenAI 兼容的对话模型客户端
//!
//! POST {base_url}/chat/completions
//! 任何兼容该协议的服务（本地模型网关、第三方代理）都可以使用

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{ChatCompletionPort, ChatError, ChatMessage, ChatRequest};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct OpenAiChatClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiChatClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
        }
    }
}

pub struct OpenAiChatClient {
    client: Client,
    config: OpenAiChatClientConfig,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiChatClientConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// 取出第一个候选的文本内容
///
/// 成功状态下的回复总要交给标注解析：信封不是 JSON 时原样返回正文，
/// 没有候选或内容为空时返回空串，由解析器走兜底。
fn extract_content(body: &str) -> String {
    let parsed: CompletionResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Completion body is not a JSON envelope, using raw body");
            return body.to_string();
        }
    };
    match parsed.choices.into_iter().next().and_then(|c| c.message.content) {
        Some(content) => content,
        None => {
            tracing::warn!("Completion has no content");
            String::new()
        }
    }
}

#[async_trait]
impl ChatCompletionPort for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatError> {
        let body = CompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let mut builder = self.client.post(self.completions_url()).json(&body);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout
            } else if e.is_connect() {
                ChatError::NetworkError(format!("Cannot connect to chat service: {}", e))
            } else {
                ChatError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::InvalidResponse(format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(ChatError::ServiceError {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(extract_content(&text))
    }
}
