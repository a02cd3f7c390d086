//! Annotation Command Handlers

use std::sync::Arc;

use crate::application::annotator::AiAnnotator;
use crate::application::commands::annotation_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    SessionError, SessionEventPort, SessionManagerPort, VoiceLibraryPort,
};
use crate::domain::performance::{SegmentationSession, SessionId};

/// 标注占用标记：离开作用域（包括任务 panic 展开）时释放
struct AnnotationGuard {
    session_manager: Arc<dyn SessionManagerPort>,
    session_id: SessionId,
}

impl Drop for AnnotationGuard {
    fn drop(&mut self) {
        self.session_manager.end_annotation(&self.session_id);
    }
}

/// AnnotateSession Handler - AI 标注并整体替换会话内容
///
/// 同一会话同时只允许一个标注；标注期间会话若被修改，结果直接丢弃。
pub struct AnnotateSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    voice_library: Arc<dyn VoiceLibraryPort>,
    annotator: Arc<AiAnnotator>,
    events: Arc<dyn SessionEventPort>,
}

impl AnnotateSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        voice_library: Arc<dyn VoiceLibraryPort>,
        annotator: Arc<AiAnnotator>,
        events: Arc<dyn SessionEventPort>,
    ) -> Self {
        Self {
            session_manager,
            voice_library,
            annotator,
            events,
        }
    }

    /// 受理后在后台执行，结果通过事件推送
    pub fn accept(
        self: &Arc<Self>,
        cmd: AnnotateSessionCommand,
    ) -> Result<AnnotationAccepted, ApplicationError> {
        let (snapshot, guard) = self.begin(&cmd)?;
        let accepted = AnnotationAccepted {
            session_id: cmd.session_id,
            base_version: snapshot.version(),
            lines: snapshot.line_count(),
        };

        let handler = Arc::clone(self);
        tokio::spawn(async move {
            let _ = handler.run(snapshot, guard).await;
        });

        Ok(accepted)
    }

    /// 执行并等待完成
    pub async fn handle(
        &self,
        cmd: AnnotateSessionCommand,
    ) -> Result<AnnotateSessionResponse, ApplicationError> {
        let (snapshot, guard) = self.begin(&cmd)?;
        self.run(snapshot, guard).await
    }

    fn begin(
        &self,
        cmd: &AnnotateSessionCommand,
    ) -> Result<(SegmentationSession, AnnotationGuard), ApplicationError> {
        let snapshot = self.session_manager.get(&cmd.session_id)?;
        if snapshot.lines().iter().all(|l| l.trim().is_empty()) {
            return Err(ApplicationError::validation("Session has no text to annotate"));
        }
        self.session_manager.begin_annotation(&cmd.session_id)?;
        let guard = AnnotationGuard {
            session_manager: self.session_manager.clone(),
            session_id: cmd.session_id,
        };
        Ok((snapshot, guard))
    }

    async fn run(
        &self,
        snapshot: SegmentationSession,
        guard: AnnotationGuard,
    ) -> Result<AnnotateSessionResponse, ApplicationError> {
        let session_id = *snapshot.id();
        let result = self.annotate_and_merge(snapshot).await;
        drop(guard);

        match &result {
            Ok(response) => self.events.annotation_completed(
                &session_id,
                response.segments,
                response.heuristic_batches,
            ),
            Err(e) => self.events.annotation_failed(&session_id, &e.to_string()),
        }
        result
    }

    async fn annotate_and_merge(
        &self,
        snapshot: SegmentationSession,
    ) -> Result<AnnotateSessionResponse, ApplicationError> {
        let session_id = *snapshot.id();
        let base_version = snapshot.version();
        let library = self.voice_library.load().await?;

        let analysis = self
            .annotator
            .annotate(&session_id, &snapshot.lines(), &snapshot.roles().names(), &library)
            .await?;

        let mut updated = snapshot;
        updated.apply_analysis(&analysis);
        let version = updated.version();

        match self.session_manager.replace(&session_id, updated, base_version) {
            Ok(()) => {}
            Err(SessionError::VersionConflict { actual, .. }) => {
                tracing::warn!(
                    session_id = %session_id,
                    base_version = base_version,
                    current_version = actual,
                    "Session changed during annotation, discarding result"
                );
                return Err(ApplicationError::invalid_state(
                    "Session changed during annotation, result discarded",
                ));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            session_id = %session_id,
            segments = analysis.segments.len(),
            roles = analysis.roles.len(),
            version = version,
            "Annotation applied"
        );

        Ok(AnnotateSessionResponse {
            session_id,
            version,
            segments: analysis.segments.len(),
            roles: analysis.roles.iter().map(|r| r.name.clone()).collect(),
            heuristic_batches: analysis.heuristic_batches,
        })
    }
}
