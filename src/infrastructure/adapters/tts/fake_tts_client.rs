//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 返回固定的音频字节，记录收到的请求，可注入失败

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::application::ports::{SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 固定返回的音频数据
    pub audio_data: Vec<u8>,
    /// 固定返回的音频时长（毫秒）
    pub duration_ms: u64,
    pub sample_rate: u32,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            audio_data: b"RIFF\0\0\0\0WAVEfake".to_vec(),
            duration_ms: 1000,
            sample_rate: 22050,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    requests: Mutex<Vec<SynthesisRequest>>,
    /// 包含这些文本的请求会失败
    failing_texts: Mutex<HashSet<String>>,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        Self {
            config,
            requests: Mutex::new(Vec::new()),
            failing_texts: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, text: impl Into<String>) {
        if let Ok(mut set) = self.failing_texts.lock() {
            set.insert(text.into());
        }
    }

    /// 已收到的请求（按到达顺序）
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Default for FakeTtsClient {
    fn default() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice_ref = %request.voice,
            "FakeTtsClient: returning fixed audio"
        );

        let fail = self
            .failing_texts
            .lock()
            .map(|set| set.contains(&request.text))
            .unwrap_or(false);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if fail {
            return Err(TtsError::ServiceError("HTTP 500: injected failure".to_string()));
        }

        Ok(SynthesisResponse {
            audio_data: self.config.audio_data.clone(),
            duration_ms: Some(self.config.duration_ms),
            sample_rate: Some(self.config.sample_rate),
        })
    }
}
