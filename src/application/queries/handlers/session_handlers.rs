//! Session Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{SessionManagerPort, VoiceLibraryPort};
use crate::application::queries::{GetPerformancePlan, GetSession};
use crate::domain::performance::{
    EmotionVector, PerformanceItem, SessionId, SessionStats, SpeedFactor, VoiceResolution,
};
use crate::domain::script::SplitMode;
use crate::domain::text::LengthWarning;

// ============================================================================
// Response DTOs
// ============================================================================

/// 单行视图
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub index: usize,
    pub text: String,
    pub role: String,
    pub voice: VoiceResolution,
    pub emotion: EmotionVector,
    /// 如 "Σ=0.60"
    pub emotion_summary: String,
    pub speed: SpeedFactor,
    pub han_count: usize,
    pub warning: LengthWarning,
}

/// 角色视图
#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub name: String,
    pub voice: Option<String>,
    pub description: Option<String>,
    /// 分配到该角色的行数
    pub lines: usize,
}

/// 会话详情响应
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub version: u64,
    pub mode: SplitMode,
    pub chars_per_line: usize,
    pub lines: Vec<LineView>,
    pub roles: Vec<RoleView>,
    pub stats: SessionStats,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetSession Handler
pub struct GetSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    voice_library: Arc<dyn VoiceLibraryPort>,
}

impl GetSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        voice_library: Arc<dyn VoiceLibraryPort>,
    ) -> Self {
        Self {
            session_manager,
            voice_library,
        }
    }

    pub async fn handle(&self, query: GetSession) -> Result<SessionView, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        let library = self.voice_library.load().await?;
        let stats = session.stats();

        let lines = session
            .segments()
            .iter()
            .zip(&stats.lines)
            .map(|(seg, line_stats)| {
                let index = seg.index();
                let role = session.role_of(index).to_string();
                let emotion = session.emotion_of(index);
                LineView {
                    index,
                    text: seg.text().to_string(),
                    voice: session.roles().resolve_voice(&role, &library),
                    role,
                    emotion,
                    emotion_summary: emotion.summary(),
                    speed: session.speed_of(index),
                    han_count: line_stats.han_count,
                    warning: line_stats.warning,
                }
            })
            .collect::<Vec<_>>();

        let roles = session
            .roles()
            .roles()
            .iter()
            .map(|r| RoleView {
                name: r.name().to_string(),
                voice: r.voice().map(|v| v.to_string()),
                description: r.description().map(str::to_string),
                lines: lines.iter().filter(|l| l.role == r.name()).count(),
            })
            .collect();

        Ok(SessionView {
            session_id: query.session_id,
            version: session.version(),
            mode: session.mode(),
            chars_per_line: session.config().chars_per_line,
            lines,
            roles,
            stats,
            created_at: session.created_at().to_rfc3339(),
            updated_at: session.updated_at().to_rfc3339(),
        })
    }
}

/// GetPerformancePlan Handler
pub struct GetPerformancePlanHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    voice_library: Arc<dyn VoiceLibraryPort>,
}

impl GetPerformancePlanHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        voice_library: Arc<dyn VoiceLibraryPort>,
    ) -> Self {
        Self {
            session_manager,
            voice_library,
        }
    }

    pub async fn handle(&self, query: GetPerformancePlan) -> Result<Vec<PerformanceItem>, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        let library = self.voice_library.load().await?;
        Ok(session.performance_plan(&library))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::{SegmentationSession, SessionEdit};
    use crate::domain::script::SegmenterConfig;
    use crate::infrastructure::adapters::FsVoiceLibrary;
    use crate::infrastructure::memory::InMemorySessionManager;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_session_view_resolves_voices_and_warnings() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();
        std::fs::write(dir.path().join("b.wav"), b"RIFF").unwrap();
        let b_ref = dir.path().join("b.wav").to_string_lossy().to_string();

        let mut session = SegmentationSession::new(
            &format!("短句。{}。", "长".repeat(19)),
            SplitMode::Punctuation,
            SegmenterConfig::default(),
        );
        session
            .apply(SessionEdit::UpsertRole {
                name: "甲".into(),
                voice: Some(b_ref.clone()),
                description: Some("主角".into()),
            })
            .unwrap();
        session
            .apply(SessionEdit::AssignRole {
                index: 0,
                role: "甲".into(),
            })
            .unwrap();

        let sessions = Arc::new(InMemorySessionManager::new());
        let id = sessions.create(session).unwrap();
        let handler = GetSessionHandler::new(sessions, Arc::new(FsVoiceLibrary::new(dir.path())));

        let view = handler.handle(GetSession { session_id: id }).await.unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].voice.voice().map(|v| v.to_string()), Some(b_ref));
        assert!(!view.lines[0].voice.is_fallback());
        assert!(view.lines[1].voice.is_fallback());
        assert_eq!(view.lines[1].warning, LengthWarning::Hard);
        assert_eq!(view.roles[0].lines, 1);
        assert_eq!(view.lines[0].emotion_summary, "Σ=0.00");
    }
}
