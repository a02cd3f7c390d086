//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现，每个会话一个广播通道

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::SessionEventPort;
use crate::domain::performance::SessionId;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 标注开始
    AnnotationStarted {
        session_id: String,
        batches: usize,
    },
    /// 一批标注完成
    AnnotationBatchCompleted {
        session_id: String,
        batch: usize,
        total: usize,
        /// segments / assignments / heuristic / default_narrator
        source: String,
    },
    /// 标注结果已合并进会话
    AnnotationCompleted {
        session_id: String,
        segments: usize,
        heuristic_batches: usize,
    },
    /// 标注失败，会话未改动
    AnnotationFailed {
        session_id: String,
        error: String,
    },
    /// 一个片段的音频已写出
    SegmentSynthesized {
        session_id: String,
        job_id: String,
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    /// 一个片段合成失败
    SynthesisFailed {
        session_id: String,
        job_id: String,
        index: usize,
        error: String,
    },
    /// 任务结束
    SynthesisCompleted {
        session_id: String,
        job_id: String,
        produced: usize,
        failed: usize,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<SessionId, broadcast::Sender<WsEvent>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            session_channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &SessionId) -> broadcast::Receiver<WsEvent> {
        self.session_channels
            .entry(*session_id)
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &SessionId) {
        self.session_channels.remove(session_id);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &SessionId) -> Option<broadcast::Receiver<WsEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    pub fn publish_segment_synthesized(
        &self,
        session_id: &SessionId,
        job_id: &str,
        index: usize,
        duration_ms: Option<u64>,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::SegmentSynthesized {
                session_id: session_id.to_string(),
                job_id: job_id.to_string(),
                index,
                duration_ms,
            },
        );
    }

    pub fn publish_synthesis_failed(
        &self,
        session_id: &SessionId,
        job_id: &str,
        index: usize,
        error: &str,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::SynthesisFailed {
                session_id: session_id.to_string(),
                job_id: job_id.to_string(),
                index,
                error: error.to_string(),
            },
        );
    }

    pub fn publish_synthesis_completed(
        &self,
        session_id: &SessionId,
        job_id: &str,
        produced: usize,
        failed: usize,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::SynthesisCompleted {
                session_id: session_id.to_string(),
                job_id: job_id.to_string(),
                produced,
                failed,
            },
        );
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &SessionId, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventPort for EventPublisher {
    fn annotation_started(&self, session_id: &SessionId, batches: usize) {
        self.publish_to_session(
            session_id,
            WsEvent::AnnotationStarted {
                session_id: session_id.to_string(),
                batches,
            },
        );
    }

    fn annotation_batch_completed(
        &self,
        session_id: &SessionId,
        batch: usize,
        total: usize,
        source: &str,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::AnnotationBatchCompleted {
                session_id: session_id.to_string(),
                batch,
                total,
                source: source.to_string(),
            },
        );
    }

    fn annotation_completed(&self, session_id: &SessionId, segments: usize, heuristic_batches: usize) {
        self.publish_to_session(
            session_id,
            WsEvent::AnnotationCompleted {
                session_id: session_id.to_string(),
                segments,
                heuristic_batches,
            },
        );
    }

    fn annotation_failed(&self, session_id: &SessionId, error: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::AnnotationFailed {
                session_id: session_id.to_string(),
                error: error.to_string(),
            },
        );
    }

    fn session_closed(&self, session_id: &SessionId, reason: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::SessionClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
        self.unregister_session(session_id);
    }
}
