//! Job Manager Port - 合成任务管理
//!
//! 一个任务 = 一个会话的完整演绎计划，片段在任务内按顺序合成。
//! 具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::tts_engine::EmotionControl;
use crate::domain::performance::{PerformanceItem, SessionId};

/// Job Manager 错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// 等待合成
    Pending,
    /// 正在合成
    Running,
    /// 全部片段已处理
    Completed,
    /// 已取消
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

/// 单个片段的合成失败
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentFailure {
    pub index: usize,
    pub error: String,
}

/// 合成任务
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub job_id: String,
    pub session_id: SessionId,
    pub items: Vec<PerformanceItem>,
    pub emotion_weight: f32,
    /// 零情感向量片段的控制方式
    pub neutral_emotion: EmotionControl,
    pub state: JobState,
    /// 已写出音频的片段索引
    pub produced: Vec<usize>,
    pub failures: Vec<SegmentFailure>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SynthesisJob {
    pub fn new(session_id: SessionId, items: Vec<PerformanceItem>, emotion_weight: f32) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            session_id,
            items,
            emotion_weight,
            neutral_emotion: EmotionControl::MatchVoiceReference,
            state: JobState::Pending,
            produced: Vec::new(),
            failures: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_neutral_emotion(mut self, control: EmotionControl) -> Self {
        self.neutral_emotion = control;
        self
    }
}

/// 片段音频的输出位置：{audio_dir}/{session}/{index:04}.wav
pub fn segment_audio_path(audio_dir: &Path, session_id: &SessionId, index: usize) -> PathBuf {
    audio_dir
        .join(session_id.to_string())
        .join(format!("{:04}.wav", index))
}

/// Job Manager Port
pub trait JobManagerPort: Send + Sync {
    /// 提交任务到队列
    fn submit(&self, job: SynthesisJob) -> Result<String, JobError>;

    /// 获取任务
    fn get_job(&self, job_id: &str) -> Option<SynthesisJob>;

    /// 设置任务状态
    fn set_state(&self, job_id: &str, state: JobState) -> Result<(), JobError>;

    /// 记录一个片段的结果
    fn record_segment(&self, job_id: &str, index: usize, result: Result<(), String>) -> Result<(), JobError>;

    /// 检查任务是否已取消（不存在的任务视为已取消）
    fn is_cancelled(&self, job_id: &str) -> bool;

    /// 取消会话的所有未完成任务，返回取消数量
    fn cancel_session(&self, session_id: &SessionId) -> usize;

    /// 获取会话的所有任务
    fn jobs_by_session(&self, session_id: &SessionId) -> Vec<SynthesisJob>;

    /// 清理会话的所有任务
    fn cleanup_session(&self, session_id: &SessionId);
}
