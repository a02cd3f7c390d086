//! Session Command Handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::commands::session_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    JobManagerPort, LineState, SessionEventPort, SessionManagerPort, StateStorePort,
};
use crate::domain::performance::{EditOutcome, RoleTable, SegmentationSession};
use crate::domain::script::{SegmenterConfig, SplitMode};

/// 新会话的默认分段参数
#[derive(Debug, Clone, Default)]
pub struct SessionDefaults {
    pub mode: SplitMode,
    pub config: SegmenterConfig,
    /// 恢复行注解时是否包含情感（语速总是恢复）
    pub restore_line_emotions: bool,
}

/// CreateSession Handler - 分段并创建会话
pub struct CreateSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    state_store: Arc<dyn StateStorePort>,
    defaults: SessionDefaults,
}

impl CreateSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        state_store: Arc<dyn StateStorePort>,
        defaults: SessionDefaults,
    ) -> Self {
        Self {
            session_manager,
            state_store,
            defaults,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<CreateSessionResponse, ApplicationError> {
        let mode = cmd.mode.unwrap_or(self.defaults.mode);
        let mut session = SegmentationSession::new(&cmd.text, mode, self.defaults.config.clone());

        // 角色表独立于文本持久化
        let roles = self.state_store.load_roles().await?;
        if !roles.is_empty() {
            session.restore_roles(RoleTable::restore(roles));
        }

        if let Some(from) = cmd.restore_from {
            match self.state_store.load_line_state(&from).await? {
                Some(state) => {
                    let emotions = if self.defaults.restore_line_emotions {
                        state.emotions
                    } else {
                        BTreeMap::new()
                    };
                    session.restore_line_state(emotions, state.speeds);
                }
                None => {
                    tracing::warn!(restore_from = %from, "No saved line state, starting clean");
                }
            }
        }

        let response = CreateSessionResponse {
            session_id: *session.id(),
            version: session.version(),
            mode,
            segments: session.lines(),
        };
        self.session_manager.create(session)?;

        tracing::info!(
            session_id = %response.session_id,
            mode = %mode,
            segments = response.segments.len(),
            "Segmentation session created"
        );
        Ok(response)
    }
}

/// Resegment Handler - 重新分段（角色表保留，行注解清空）
pub struct ResegmentHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl ResegmentHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, cmd: ResegmentCommand) -> Result<EditSessionResponse, ApplicationError> {
        let mut session = self.session_manager.get(&cmd.session_id)?;
        let base_version = session.version();

        session.resegment(cmd.text.as_deref(), cmd.mode);
        let line_count = session.line_count();
        let version = session.version();
        self.session_manager
            .replace(&cmd.session_id, session, base_version)?;

        tracing::info!(
            session_id = %cmd.session_id,
            mode = ?cmd.mode,
            line_count = line_count,
            "Session resegmented"
        );

        Ok(EditSessionResponse {
            session_id: cmd.session_id,
            version,
            outcome: EditOutcome {
                line_count,
                affected: line_count,
            },
        })
    }
}

/// EditSession Handler - 行编辑、注解、批量操作、角色表
pub struct EditSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl EditSessionHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(&self, cmd: EditSessionCommand) -> Result<EditSessionResponse, ApplicationError> {
        let mut session = self.session_manager.get(&cmd.session_id)?;
        let base_version = session.version();

        if let Some(expected) = cmd.expected_version {
            if expected != base_version {
                return Err(ApplicationError::invalid_state(format!(
                    "Session version is {}, client has {}",
                    base_version, expected
                )));
            }
        }

        let kind = cmd.edit.kind();
        let outcome = session.apply(cmd.edit)?;
        let version = session.version();
        self.session_manager
            .replace(&cmd.session_id, session, base_version)?;

        tracing::debug!(
            session_id = %cmd.session_id,
            edit = kind,
            line_count = outcome.line_count,
            affected = outcome.affected,
            "Session edited"
        );

        Ok(EditSessionResponse {
            session_id: cmd.session_id,
            version,
            outcome,
        })
    }
}

/// SaveSession Handler - 持久化角色表与行注解
pub struct SaveSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    state_store: Arc<dyn StateStorePort>,
}

impl SaveSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        state_store: Arc<dyn StateStorePort>,
    ) -> Self {
        Self {
            session_manager,
            state_store,
        }
    }

    pub async fn handle(&self, cmd: SaveSessionCommand) -> Result<SaveSessionResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;

        // 全局角色表：本会话的设置覆盖已有条目
        let mut roles = self.state_store.load_roles().await?;
        roles.extend(session.roles().serialize());
        self.state_store.save_roles(&roles).await?;

        let state = LineState {
            emotions: session.emotion_map(),
            speeds: session.speed_map(),
        };
        self.state_store
            .save_line_state(&cmd.session_id, &state)
            .await?;

        tracing::info!(
            session_id = %cmd.session_id,
            roles = roles.len(),
            emotions = state.emotions.len(),
            speeds = state.speeds.len(),
            "Session state saved"
        );

        Ok(SaveSessionResponse {
            session_id: cmd.session_id,
            roles: roles.len(),
            emotions: state.emotions.len(),
            speeds: state.speeds.len(),
        })
    }
}

/// CloseSession Handler - 关闭会话
pub struct CloseSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    job_manager: Arc<dyn JobManagerPort>,
    events: Arc<dyn SessionEventPort>,
}

impl CloseSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        job_manager: Arc<dyn JobManagerPort>,
        events: Arc<dyn SessionEventPort>,
    ) -> Self {
        Self {
            session_manager,
            job_manager,
            events,
        }
    }

    pub async fn handle(&self, cmd: CloseSessionCommand) -> Result<CloseSessionResponse, ApplicationError> {
        // 关闭会话
        self.session_manager.close(&cmd.session_id)?;

        // 取消并清理合成任务
        let cancelled_jobs = self.job_manager.cancel_session(&cmd.session_id);
        self.job_manager.cleanup_session(&cmd.session_id);

        // 发布会话关闭事件
        self.events.session_closed(&cmd.session_id, "client_close");

        tracing::info!(
            session_id = %cmd.session_id,
            cancelled_jobs = cancelled_jobs,
            "Session closed"
        );

        Ok(CloseSessionResponse {
            session_id: cmd.session_id,
            cancelled_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoopSessionEvents;
    use crate::domain::performance::{EmotionAxis, EmotionVector, SessionEdit, SessionId};
    use crate::infrastructure::memory::{InMemoryJobManager, InMemorySessionManager};
    use crate::infrastructure::persistence::SledStateStore;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    struct Fixture {
        _dir: tempfile::TempDir,
        sessions: Arc<InMemorySessionManager>,
        store: Arc<SledStateStore>,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = SledStateStore::open(dir.path().join("state.sled")).unwrap();
        Fixture {
            _dir: dir,
            sessions: Arc::new(InMemorySessionManager::new()),
            store: Arc::new(store),
        }
    }

    fn defaults() -> SessionDefaults {
        SessionDefaults {
            mode: SplitMode::Punctuation,
            restore_line_emotions: true,
            ..Default::default()
        }
    }

    async fn create(f: &Fixture, text: &str) -> CreateSessionResponse {
        CreateSessionHandler::new(f.sessions.clone(), f.store.clone(), defaults())
            .handle(CreateSessionCommand {
                text: text.to_string(),
                mode: None,
                restore_from: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_uses_default_mode() {
        let f = fixture();
        let created = create(&f, "第一句。第二句。第三句。").await;
        assert_eq!(created.mode, SplitMode::Punctuation);
        assert_eq!(created.segments, vec!["第一句。", "第二句。", "第三句。"]);
        assert!(f.sessions.is_valid(&created.session_id));
    }

    #[tokio::test]
    async fn test_edit_checks_expected_version() {
        let f = fixture();
        let created = create(&f, "一。二。三。").await;
        let handler = EditSessionHandler::new(f.sessions.clone());

        let edited = handler
            .handle(EditSessionCommand {
                session_id: created.session_id,
                edit: SessionEdit::Delete { index: 0 },
                expected_version: Some(created.version),
            })
            .await
            .unwrap();
        assert_eq!(edited.outcome.line_count, 2);
        assert!(edited.version > created.version);

        let stale = handler
            .handle(EditSessionCommand {
                session_id: created.session_id,
                edit: SessionEdit::Delete { index: 0 },
                expected_version: Some(created.version),
            })
            .await;
        assert!(matches!(stale, Err(ApplicationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_edit_error_leaves_session_untouched() {
        let f = fixture();
        let created = create(&f, "一。二。").await;
        let handler = EditSessionHandler::new(f.sessions.clone());

        let err = handler
            .handle(EditSessionCommand {
                session_id: created.session_id,
                edit: SessionEdit::Delete { index: 9 },
                expected_version: None,
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::ValidationError(_))));
        let session = f.sessions.get(&created.session_id).unwrap();
        assert_eq!(session.version(), created.version);
        assert_eq!(session.line_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let f = fixture();
        let err = ResegmentHandler::new(f.sessions.clone())
            .handle(ResegmentCommand {
                session_id: SessionId::new(),
                text: None,
                mode: None,
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_then_restore_line_state() {
        let f = fixture();
        let created = create(&f, "一。二。三。").await;
        let edit = EditSessionHandler::new(f.sessions.clone());
        for e in [
            SessionEdit::UpsertRole {
                name: "小明".into(),
                voice: Some("voices/boy.wav".into()),
                description: None,
            },
            SessionEdit::SetEmotion {
                index: 1,
                emotion: EmotionVector::from(EmotionAxis::Anger),
            },
            SessionEdit::SetSpeed { index: 2, speed: 1.5 },
        ] {
            edit.handle(EditSessionCommand {
                session_id: created.session_id,
                edit: e,
                expected_version: None,
            })
            .await
            .unwrap();
        }

        let saved = SaveSessionHandler::new(f.sessions.clone(), f.store.clone())
            .handle(SaveSessionCommand {
                session_id: created.session_id,
            })
            .await
            .unwrap();
        assert_eq!((saved.roles, saved.emotions, saved.speeds), (1, 1, 1));

        let restored = CreateSessionHandler::new(f.sessions.clone(), f.store.clone(), defaults())
            .handle(CreateSessionCommand {
                text: "一。二。三。".into(),
                mode: None,
                restore_from: Some(created.session_id),
            })
            .await
            .unwrap();
        let session = f.sessions.get(&restored.session_id).unwrap();
        assert!(session.roles().contains("小明"));
        assert_eq!(session.emotion_of(1), EmotionVector::from(EmotionAxis::Anger));
        assert_eq!(session.speed_of(2).value(), 1.5);
    }

    #[tokio::test]
    async fn test_close_cancels_jobs() {
        let f = fixture();
        let created = create(&f, "一。").await;
        let (tx, _rx) = mpsc::channel(8);
        let jobs = Arc::new(InMemoryJobManager::new(tx));
        jobs.submit(crate::application::ports::SynthesisJob::new(
            created.session_id,
            Vec::new(),
            0.65,
        ))
        .unwrap();

        let closed = CloseSessionHandler::new(f.sessions.clone(), jobs.clone(), Arc::new(NoopSessionEvents))
            .handle(CloseSessionCommand {
                session_id: created.session_id,
            })
            .await
            .unwrap();
        assert_eq!(closed.cancelled_jobs, 1);
        assert!(!f.sessions.is_valid(&created.session_id));
        assert!(jobs.jobs_by_session(&created.session_id).is_empty());
    }
}
