//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::performance::{SessionEdit, SessionId};
use crate::domain::script::SplitMode;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub text: String,
    #[serde(default)]
    pub mode: Option<SplitMode>,
    /// 从该会话保存的行注解恢复
    #[serde(default)]
    pub restore_from: Option<SessionId>,
}

/// 只携带会话 ID 的请求（get / plan / save / close / annotate）
#[derive(Debug, Deserialize)]
pub struct SessionIdRequest {
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct ResegmentRequest {
    pub session_id: SessionId,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub mode: Option<SplitMode>,
}

#[derive(Debug, Deserialize)]
pub struct EditSessionRequest {
    pub session_id: SessionId,
    pub edit: SessionEdit,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VoiceAudioRequest {
    pub voice_ref: String,
}

// ============================================================================
// Synthesis DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitSynthesisRequest {
    pub session_id: SessionId,
    #[serde(default)]
    pub emotion_weight: Option<f32>,
    #[serde(default)]
    pub emotion_audio: Option<PathBuf>,
    #[serde(default)]
    pub emotion_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SynthesisStatusRequest {
    pub job_id: String,
}
