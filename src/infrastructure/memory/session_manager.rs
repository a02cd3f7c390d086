//! In-Memory Session Manager Implementation

use dashmap::{DashMap, DashSet};
use std::sync::Arc;

use crate::application::ports::{SessionError, SessionManagerPort};
use crate::domain::performance::{SegmentationSession, SessionId};

/// 内存会话管理器
pub struct InMemorySessionManager {
    sessions: DashMap<SessionId, SegmentationSession>,
    /// 正在标注的会话
    annotating: DashSet<SessionId>,
}

impl InMemorySessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            annotating: DashSet::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerPort for InMemorySessionManager {
    fn create(&self, session: SegmentationSession) -> Result<SessionId, SessionError> {
        let session_id = *session.id();
        if self.sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists(session_id.to_string()));
        }
        self.sessions.insert(session_id, session);
        tracing::info!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    fn get(&self, id: &SessionId) -> Result<SegmentationSession, SessionError> {
        self.sessions
            .get(id)
            .map(|s| s.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn replace(
        &self,
        id: &SessionId,
        session: SegmentationSession,
        expected_version: u64,
    ) -> Result<(), SessionError> {
        let mut current = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let actual = current.version();
        if actual != expected_version {
            return Err(SessionError::VersionConflict {
                id: id.to_string(),
                expected: expected_version,
                actual,
            });
        }

        *current = session;
        tracing::debug!(
            session_id = %id,
            from = actual,
            to = current.version(),
            "Session replaced"
        );
        Ok(())
    }

    fn begin_annotation(&self, id: &SessionId) -> Result<(), SessionError> {
        if !self.sessions.contains_key(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        if !self.annotating.insert(*id) {
            return Err(SessionError::AnnotationInProgress(id.to_string()));
        }
        Ok(())
    }

    fn end_annotation(&self, id: &SessionId) {
        self.annotating.remove(id);
    }

    fn is_valid(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    fn close(&self, id: &SessionId) -> Result<(), SessionError> {
        self.annotating.remove(id);
        self.sessions
            .remove(id)
            .map(|_| {
                tracing::info!(session_id = %id, "Session closed");
            })
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn list_all(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }
}
