//! Session Manager Port - 分段会话生命周期管理
//!
//! 会话由编排层显式持有，按 ID 取出、修改、写回；
//! 具体实现在 infrastructure/memory 层

use thiserror::Error;

use crate::domain::performance::{SegmentationSession, SessionId};

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// 写回时版本已变化，结果应丢弃
    #[error("Session {id} changed (expected version {expected}, found {actual})")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Annotation already in progress: {0}")]
    AnnotationInProgress(String),
}

/// Session Manager Port
///
/// 所有状态存储在内存中
pub trait SessionManagerPort: Send + Sync {
    /// 创建新会话
    fn create(&self, session: SegmentationSession) -> Result<SessionId, SessionError>;

    /// 获取会话快照
    fn get(&self, id: &SessionId) -> Result<SegmentationSession, SessionError>;

    /// 仅当当前版本等于 expected_version 时替换
    fn replace(
        &self,
        id: &SessionId,
        session: SegmentationSession,
        expected_version: u64,
    ) -> Result<(), SessionError>;

    /// 标记一次标注开始；已有标注进行中时返回 AnnotationInProgress
    fn begin_annotation(&self, id: &SessionId) -> Result<(), SessionError>;

    /// 标注结束（无论成功与否）
    fn end_annotation(&self, id: &SessionId);

    /// 检查会话是否有效
    fn is_valid(&self, id: &SessionId) -> bool;

    /// 关闭会话
    fn close(&self, id: &SessionId) -> Result<(), SessionError>;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<SessionId>;
}
