//! Synthesis Queries - 合成任务与音频查询

use crate::domain::performance::SessionId;

/// 查询合成任务状态
#[derive(Debug, Clone)]
pub struct GetSynthesisJob {
    pub job_id: String,
}

/// 获取片段音频
#[derive(Debug, Clone)]
pub struct GetSegmentAudio {
    pub session_id: SessionId,
    pub index: usize,
}
