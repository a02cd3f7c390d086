//! HTTP TTS Client - 调用外部 TTS HTTP 服务
//!
//! 实现 TtsEnginePort trait，每个片段一次请求
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/synthesize
//! Request: {"text", "voice_ref", "emotion_mode", "emotion_vector"?, "emotion_audio"?,
//!           "emotion_text"?, "emotion_weight", "speed"}  (JSON)
//! Response: audio/wav binary, metadata in headers

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{
    EmotionControl, SynthesisRequest, SynthesisResponse, TtsEnginePort, TtsError,
};

/// TTS 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    /// 参考音频路径（TTS 服务自行读取并缓存）
    voice_ref: &'a str,
    emotion_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion_vector: Option<[f32; 8]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion_audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion_text: Option<&'a str>,
    emotion_weight: f32,
    speed: f32,
}

impl<'a> TtsHttpRequest<'a> {
    fn from_request(request: &'a SynthesisRequest) -> Self {
        let mut body = Self {
            text: &request.text,
            voice_ref: request.voice.as_str(),
            emotion_mode: request.emotion.mode(),
            emotion_vector: None,
            emotion_audio: None,
            emotion_text: None,
            emotion_weight: request.emotion_weight,
            speed: request.speed.value(),
        };
        match &request.emotion {
            EmotionControl::MatchVoiceReference => {}
            EmotionControl::EmotionVector(v) => body.emotion_vector = Some(*v.values()),
            EmotionControl::ReferenceAudio(path) => {
                body.emotion_audio = Some(path.to_string_lossy().into_owned())
            }
            EmotionControl::Description(text) => body.emotion_text = Some(text),
        }
        body
    }
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 重试次数（仅网络错误和超时会重试）
    pub max_retries: u32,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7860".to_string(),
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!(
            "{}/api/tts/synthesize",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        let body = TtsHttpRequest::from_request(request);

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TtsError::VoiceNotFound(request.voice.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let headers = response.headers();
        let duration_ms = headers
            .get("X-TTS-Duration-Ms")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let sample_rate = headers
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        Ok(SynthesisResponse {
            audio_data,
            duration_ms,
            sample_rate,
        })
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError> {
        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text.len(),
            voice_ref = %request.voice,
            emotion_mode = request.emotion.mode(),
            "Sending TTS synthesize request"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Ok(response) => {
                    tracing::info!(
                        duration_ms = ?response.duration_ms,
                        sample_rate = ?response.sample_rate,
                        audio_size = response.audio_data.len(),
                        "TTS synthesis completed"
                    );
                    return Ok(response);
                }
                Err(e @ (TtsError::NetworkError(_) | TtsError::Timeout))
                    if attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "TTS request failed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
