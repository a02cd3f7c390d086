//! In-Memory Job Manager Implementation

use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    JobError, JobManagerPort, JobState, SegmentFailure, SynthesisJob,
};
use crate::domain::performance::SessionId;

/// 内存合成任务管理器
pub struct InMemoryJobManager {
    /// job_id -> SynthesisJob
    jobs: DashMap<String, SynthesisJob>,
    /// session_id -> Set<job_id>
    session_jobs: DashMap<SessionId, HashSet<String>>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<String>,
}

impl InMemoryJobManager {
    pub fn new(queue_sender: mpsc::Sender<String>) -> Self {
        Self {
            jobs: DashMap::new(),
            session_jobs: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl JobManagerPort for InMemoryJobManager {
    fn submit(&self, job: SynthesisJob) -> Result<String, JobError> {
        let job_id = job.job_id.clone();
        let session_id = job.session_id;
        let segments = job.items.len();

        self.jobs.insert(job_id.clone(), job);
        self.session_jobs
            .entry(session_id)
            .or_default()
            .insert(job_id.clone());

        if let Err(e) = self.queue_sender.try_send(job_id.clone()) {
            // 未入队的任务不保留
            self.jobs.remove(&job_id);
            if let Some(mut ids) = self.session_jobs.get_mut(&session_id) {
                ids.remove(&job_id);
            }
            tracing::warn!(job_id = %job_id, error = %e, "Failed to enqueue job");
            return Err(JobError::QueueUnavailable(e.to_string()));
        }

        tracing::debug!(job_id = %job_id, session_id = %session_id, segments, "Job submitted");
        Ok(job_id)
    }

    fn get_job(&self, job_id: &str) -> Option<SynthesisJob> {
        self.jobs.get(job_id).map(|j| j.clone())
    }

    fn set_state(&self, job_id: &str, state: JobState) -> Result<(), JobError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;

        let old_state = job.state;
        // 已取消的任务不再变更
        if old_state == JobState::Cancelled {
            return Ok(());
        }
        job.state = state;
        if state.is_finished() {
            job.completed_at = Some(Utc::now());
        }

        tracing::debug!(
            job_id = %job_id,
            old_state = ?old_state,
            new_state = ?state,
            "Job state changed"
        );
        Ok(())
    }

    fn record_segment(
        &self,
        job_id: &str,
        index: usize,
        result: Result<(), String>,
    ) -> Result<(), JobError> {
        let mut job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))?;
        match result {
            Ok(()) => job.produced.push(index),
            Err(error) => job.failures.push(SegmentFailure { index, error }),
        }
        Ok(())
    }

    fn is_cancelled(&self, job_id: &str) -> bool {
        self.jobs
            .get(job_id)
            .map(|j| j.state == JobState::Cancelled)
            .unwrap_or(true) // 不存在的任务视为已取消
    }

    fn cancel_session(&self, session_id: &SessionId) -> usize {
        let mut cancelled_count = 0;

        if let Some(job_ids) = self.session_jobs.get(session_id) {
            for job_id in job_ids.iter() {
                if let Some(mut job) = self.jobs.get_mut(job_id) {
                    if !job.state.is_finished() {
                        job.state = JobState::Cancelled;
                        job.completed_at = Some(Utc::now());
                        cancelled_count += 1;
                    }
                }
            }
        }

        tracing::debug!(
            session_id = %session_id,
            cancelled_count = cancelled_count,
            "Session jobs cancelled"
        );
        cancelled_count
    }

    fn jobs_by_session(&self, session_id: &SessionId) -> Vec<SynthesisJob> {
        self.session_jobs
            .get(session_id)
            .map(|job_ids| {
                job_ids
                    .iter()
                    .filter_map(|id| self.jobs.get(id).map(|j| j.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn cleanup_session(&self, session_id: &SessionId) {
        if let Some((_, job_ids)) = self.session_jobs.remove(session_id) {
            let count = job_ids.len();
            for job_id in job_ids {
                self.jobs.remove(&job_id);
            }
            tracing::debug!(session_id = %session_id, count, "Session jobs cleaned up");
        }
    }
}
