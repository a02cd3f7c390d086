//! Synthesis Commands - 合成命令

use serde::Serialize;
use std::path::PathBuf;

use crate::domain::performance::SessionId;

/// 提交合成任务命令
#[derive(Debug, Clone)]
pub struct SubmitSynthesisCommand {
    pub session_id: SessionId,
    /// 缺省时使用配置中的情感权重
    pub emotion_weight: Option<f32>,
    /// 零情感片段使用的情感参考音频（与 emotion_text 互斥）
    pub emotion_audio: Option<PathBuf>,
    /// 零情感片段使用的情感描述文本
    pub emotion_text: Option<String>,
}

/// 提交合成任务响应
#[derive(Debug, Clone, Serialize)]
pub struct SubmitSynthesisResponse {
    pub job_id: String,
    pub session_id: SessionId,
    pub segments: usize,
    /// 使用了兜底音色的片段数
    pub fallback_voices: usize,
    /// 没有任何可用音色、将被跳过的片段数
    pub unavailable: usize,
}
