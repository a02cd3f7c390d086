//! Synthesis Query Handlers

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    segment_audio_path, JobManagerPort, JobState, SegmentFailure,
};
use crate::application::queries::{GetSegmentAudio, GetSynthesisJob};
use crate::domain::performance::SessionId;

/// 合成任务状态响应
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisJobResponse {
    pub job_id: String,
    pub session_id: SessionId,
    pub state: JobState,
    pub total: usize,
    pub produced: Vec<usize>,
    pub failures: Vec<SegmentFailure>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// GetSynthesisJob Handler
pub struct GetSynthesisJobHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl GetSynthesisJobHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, query: GetSynthesisJob) -> Result<SynthesisJobResponse, ApplicationError> {
        let job = self
            .job_manager
            .get_job(&query.job_id)
            .ok_or_else(|| ApplicationError::not_found("Job", &query.job_id))?;

        Ok(SynthesisJobResponse {
            job_id: job.job_id,
            session_id: job.session_id,
            state: job.state,
            total: job.items.len(),
            produced: job.produced,
            failures: job.failures,
            created_at: job.created_at.to_rfc3339(),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
        })
    }
}

/// GetSegmentAudio Handler - 定位已生成的片段音频
pub struct GetSegmentAudioHandler {
    audio_dir: PathBuf,
}

impl GetSegmentAudioHandler {
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
        }
    }

    pub async fn handle(&self, query: GetSegmentAudio) -> Result<PathBuf, ApplicationError> {
        let path = segment_audio_path(&self.audio_dir, &query.session_id, query.index);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            Ok(false) => Err(ApplicationError::not_found(
                "Audio",
                format!("{}/{}", query.session_id, query.index),
            )),
            Err(e) => Err(ApplicationError::StorageError(e.to_string())),
        }
    }
}
