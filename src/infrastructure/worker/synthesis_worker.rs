//! Synthesis Worker - Background TTS Job Processor
//!
//! 从队列消费任务；不同任务可以并发，同一任务内的片段严格按顺序合成

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    ensure_emotion_mode, segment_audio_path, JobManagerPort, JobState, SessionManagerPort,
    SynthesisJob, SynthesisRequest, TtsEnginePort,
};
use crate::domain::performance::{PerformanceItem, VoiceResolution};
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct SynthesisWorkerConfig {
    /// 最大并发任务数
    pub max_concurrent: usize,
    /// 音频输出目录
    pub audio_dir: PathBuf,
}

impl Default for SynthesisWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            audio_dir: PathBuf::from("data/audio"),
        }
    }
}

/// 合成 Worker
pub struct SynthesisWorker {
    config: SynthesisWorkerConfig,
    queue_receiver: mpsc::Receiver<String>,
    job_manager: Arc<dyn JobManagerPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    event_publisher: Arc<EventPublisher>,
}

/// 单个任务的执行上下文
#[derive(Clone)]
struct JobContext {
    job_manager: Arc<dyn JobManagerPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    event_publisher: Arc<EventPublisher>,
    audio_dir: PathBuf,
}

impl SynthesisWorker {
    pub fn new(
        config: SynthesisWorkerConfig,
        queue_receiver: mpsc::Receiver<String>,
        job_manager: Arc<dyn JobManagerPort>,
        session_manager: Arc<dyn SessionManagerPort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            job_manager,
            session_manager,
            tts_engine,
            event_publisher,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            audio_dir = %self.config.audio_dir.display(),
            "SynthesisWorker started"
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent.max(1)));
        let ctx = JobContext {
            job_manager: self.job_manager.clone(),
            session_manager: self.session_manager.clone(),
            tts_engine: self.tts_engine.clone(),
            event_publisher: self.event_publisher.clone(),
            audio_dir: self.config.audio_dir.clone(),
        };

        while let Some(job_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    break;
                }
            };

            let ctx = ctx.clone();
            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成
                ctx.process_job(&job_id).await;
            });
        }

        tracing::info!("SynthesisWorker stopped");
    }
}

impl JobContext {
    async fn process_job(&self, job_id: &str) {
        let job = match self.job_manager.get_job(job_id) {
            Some(j) => j,
            None => {
                tracing::warn!(job_id = %job_id, "Job not found, skipping");
                return;
            }
        };

        if self.job_manager.is_cancelled(job_id) {
            tracing::debug!(job_id = %job_id, "Job cancelled, skipping");
            return;
        }

        if let Err(e) = self.job_manager.set_state(job_id, JobState::Running) {
            tracing::error!(job_id = %job_id, error = %e, "Failed to update job state");
            return;
        }

        tracing::info!(
            job_id = %job_id,
            session_id = %job.session_id,
            segments = job.items.len(),
            "Synthesis job started"
        );

        let mut produced = 0;
        let mut failed = 0;
        for item in &job.items {
            // 每个片段前都检查，关闭会话后尽快停下
            if self.job_manager.is_cancelled(job_id) {
                tracing::info!(job_id = %job_id, index = item.index, "Job cancelled mid-way");
                return;
            }
            if !self.session_manager.is_valid(&job.session_id) {
                tracing::debug!(
                    job_id = %job_id,
                    session_id = %job.session_id,
                    "Session invalid, stopping job"
                );
                return;
            }

            match self.synthesize_item(&job, item).await {
                Ok(duration_ms) => {
                    produced += 1;
                    let _ = self.job_manager.record_segment(job_id, item.index, Ok(()));
                    self.event_publisher.publish_segment_synthesized(
                        &job.session_id,
                        job_id,
                        item.index,
                        duration_ms,
                    );
                }
                Err(error) => {
                    failed += 1;
                    tracing::error!(
                        job_id = %job_id,
                        index = item.index,
                        error = %error,
                        "Segment synthesis failed"
                    );
                    let _ = self
                        .job_manager
                        .record_segment(job_id, item.index, Err(error.clone()));
                    self.event_publisher.publish_synthesis_failed(
                        &job.session_id,
                        job_id,
                        item.index,
                        &error,
                    );
                }
            }
        }

        let _ = self.job_manager.set_state(job_id, JobState::Completed);
        self.event_publisher
            .publish_synthesis_completed(&job.session_id, job_id, produced, failed);

        tracing::info!(
            job_id = %job_id,
            session_id = %job.session_id,
            produced,
            failed,
            "Synthesis job completed"
        );
    }

    /// 合成一个片段并写出音频，返回时长
    async fn synthesize_item(
        &self,
        job: &SynthesisJob,
        item: &PerformanceItem,
    ) -> Result<Option<u64>, String> {
        let voice = match &item.voice {
            VoiceResolution::Unavailable { reason } => {
                return Err(format!("No voice available ({:?})", reason));
            }
            resolution => resolution
                .voice()
                .cloned()
                .ok_or_else(|| "No voice available".to_string())?,
        };

        let request = SynthesisRequest::new(
            item.text.clone(),
            voice,
            item.emotion,
            job.emotion_weight,
            item.speed,
        )
        .with_neutral_control(item.emotion, &job.neutral_emotion);
        ensure_emotion_mode(&item.emotion, &request.emotion).map_err(|e| e.to_string())?;

        tracing::debug!(
            job_id = %job.job_id,
            index = item.index,
            role = %item.role,
            emotion_mode = request.emotion.mode(),
            "Dispatching segment"
        );

        let response = self
            .tts_engine
            .synthesize(request)
            .await
            .map_err(|e| format!("TTS error: {}", e))?;

        // 合成期间会话可能已关闭
        if !self.session_manager.is_valid(&job.session_id) {
            return Err("Session closed during synthesis".to_string());
        }

        let path = segment_audio_path(&self.audio_dir, &job.session_id, item.index);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Storage error: {}", e))?;
        }
        tokio::fs::write(&path, &response.audio_data)
            .await
            .map_err(|e| format!("Storage error: {}", e))?;

        Ok(response.duration_ms)
    }
}
