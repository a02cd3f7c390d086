//! Session Events Port - 会话事件通知
//!
//! 标注进度与会话关闭通过此端口推送给客户端，具体实现为 EventPublisher

use crate::domain::performance::SessionId;

pub trait SessionEventPort: Send + Sync {
    fn annotation_started(&self, session_id: &SessionId, batches: usize);

    fn annotation_batch_completed(
        &self,
        session_id: &SessionId,
        batch: usize,
        total: usize,
        source: &str,
    );

    fn annotation_completed(&self, session_id: &SessionId, segments: usize, heuristic_batches: usize);

    fn annotation_failed(&self, session_id: &SessionId, error: &str);

    fn session_closed(&self, session_id: &SessionId, reason: &str);
}

/// 不推送任何事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionEvents;

impl SessionEventPort for NoopSessionEvents {
    fn annotation_started(&self, _: &SessionId, _: usize) {}
    fn annotation_batch_completed(&self, _: &SessionId, _: usize, _: usize, _: &str) {}
    fn annotation_completed(&self, _: &SessionId, _: usize, _: usize) {}
    fn annotation_failed(&self, _: &SessionId, _: &str) {}
    fn session_closed(&self, _: &SessionId, _: &str) {}
}
