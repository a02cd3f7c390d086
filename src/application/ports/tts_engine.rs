//! TTS Engine Port - 语音合成抽象
//!
//! 每个片段调用一次合成服务，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::performance::{EmotionVector, SpeedFactor};
use crate::domain::voice::VoiceRef;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// 情感控制方式
#[derive(Debug, Clone, PartialEq)]
pub enum EmotionControl {
    /// 与参考音色一致
    MatchVoiceReference,
    /// 8 维情感向量
    EmotionVector(EmotionVector),
    /// 情感参考音频
    ReferenceAudio(PathBuf),
    /// 情感描述文本
    Description(String),
}

impl EmotionControl {
    /// 非零向量必须走向量模式
    pub fn from_vector(vector: EmotionVector) -> Self {
        if vector.is_zero() {
            Self::MatchVoiceReference
        } else {
            Self::EmotionVector(vector)
        }
    }

    /// 按片段情感选择控制方式
    ///
    /// 非零向量总是向量模式；零向量使用任务指定的中性控制方式
    /// （参考音频 / 描述文本 / 与音色一致）。
    pub fn resolve(vector: EmotionVector, neutral: &EmotionControl) -> Self {
        match neutral {
            _ if !vector.is_zero() => Self::EmotionVector(vector),
            Self::EmotionVector(_) => Self::MatchVoiceReference,
            other => other.clone(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::MatchVoiceReference => "match_voice_reference",
            Self::EmotionVector(_) => "emotion_vector",
            Self::ReferenceAudio(_) => "emotion_reference_audio",
            Self::Description(_) => "emotion_description_text",
        }
    }
}

/// 单个片段的合成请求
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: VoiceRef,
    pub emotion: EmotionControl,
    /// [0, 1]
    pub emotion_weight: f32,
    pub speed: SpeedFactor,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice: VoiceRef,
        emotion: EmotionVector,
        emotion_weight: f32,
        speed: SpeedFactor,
    ) -> Self {
        Self {
            text: text.into(),
            voice,
            emotion: EmotionControl::from_vector(emotion),
            emotion_weight: emotion_weight.clamp(0.0, 1.0),
            speed,
        }
    }

    /// 零向量片段改用指定的中性控制方式
    pub fn with_neutral_control(mut self, vector: EmotionVector, neutral: &EmotionControl) -> Self {
        self.emotion = EmotionControl::resolve(vector, neutral);
        self
    }
}

/// 派发前检查：非零情感向量必须以向量模式发送
pub fn ensure_emotion_mode(vector: &EmotionVector, control: &EmotionControl) -> Result<(), TtsError> {
    match control {
        EmotionControl::EmotionVector(sent) if !sent.is_zero() => Ok(()),
        EmotionControl::EmotionVector(_) => Err(TtsError::InvalidRequest(
            "emotion_vector mode with a zero vector".to_string(),
        )),
        _ if vector.is_zero() => Ok(()),
        other => Err(TtsError::InvalidRequest(format!(
            "non-zero emotion vector sent with {} mode",
            other.mode()
        ))),
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    /// 原始音频数据（WAV）
    pub audio_data: Vec<u8>,
    /// 音频时长（毫秒）
    pub duration_ms: Option<u64>,
    pub sample_rate: Option<u32>,
}

/// TTS Engine Port
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 合成单个片段
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResponse, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::EmotionAxis;

    fn voice() -> VoiceRef {
        VoiceRef::new("voices/a.wav").unwrap()
    }

    #[test]
    fn test_non_zero_vector_uses_vector_mode() {
        let joy = EmotionVector::from(EmotionAxis::Joy);
        let req = SynthesisRequest::new("你好", voice(), joy, 0.65, SpeedFactor::NORMAL);
        assert_eq!(req.emotion.mode(), "emotion_vector");
        assert!(ensure_emotion_mode(&joy, &req.emotion).is_ok());
    }

    #[test]
    fn test_zero_vector_matches_voice() {
        let req = SynthesisRequest::new("你好", voice(), EmotionVector::zero(), 2.0, SpeedFactor::NORMAL);
        assert_eq!(req.emotion, EmotionControl::MatchVoiceReference);
        assert_eq!(req.emotion_weight, 1.0);
        assert!(ensure_emotion_mode(&EmotionVector::zero(), &req.emotion).is_ok());
    }

    #[test]
    fn test_non_zero_vector_rejected_in_other_modes() {
        let joy = EmotionVector::from(EmotionAxis::Joy);
        assert!(ensure_emotion_mode(&joy, &EmotionControl::MatchVoiceReference).is_err());
        assert!(ensure_emotion_mode(&joy, &EmotionControl::Description("开心".into())).is_err());
        assert!(ensure_emotion_mode(
            &EmotionVector::zero(),
            &EmotionControl::EmotionVector(EmotionVector::zero())
        )
        .is_err());
    }

    #[test]
    fn test_neutral_control_only_applies_to_zero_vectors() {
        let audio = EmotionControl::ReferenceAudio(PathBuf::from("emo/calm.wav"));
        let text = EmotionControl::Description("平静地叙述".to_string());

        let zero = EmotionVector::default();
        assert_eq!(EmotionControl::resolve(zero, &audio), audio);
        assert_eq!(EmotionControl::resolve(zero, &text), text);
        assert!(ensure_emotion_mode(&zero, &audio).is_ok());

        let anger = EmotionVector::from(EmotionAxis::Anger);
        let req = SynthesisRequest::new("滚！", voice(), anger, 0.65, SpeedFactor::NORMAL)
            .with_neutral_control(anger, &text);
        assert_eq!(req.emotion.mode(), "emotion_vector");
        assert!(ensure_emotion_mode(&anger, &req.emotion).is_ok());
    }
}
