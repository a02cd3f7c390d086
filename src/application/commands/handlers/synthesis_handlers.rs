//! Synthesis Command Handlers

use std::sync::Arc;

use crate::application::commands::synthesis_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    EmotionControl, JobManagerPort, SessionManagerPort, SynthesisJob, VoiceLibraryPort,
};
use crate::domain::performance::VoiceResolution;

/// SubmitSynthesis Handler - 按演绎计划提交合成任务
pub struct SubmitSynthesisHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    voice_library: Arc<dyn VoiceLibraryPort>,
    job_manager: Arc<dyn JobManagerPort>,
    default_emotion_weight: f32,
}

impl SubmitSynthesisHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        voice_library: Arc<dyn VoiceLibraryPort>,
        job_manager: Arc<dyn JobManagerPort>,
        default_emotion_weight: f32,
    ) -> Self {
        Self {
            session_manager,
            voice_library,
            job_manager,
            default_emotion_weight,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitSynthesisCommand,
    ) -> Result<SubmitSynthesisResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        let library = self.voice_library.load().await?;

        let plan = session.performance_plan(&library);
        if plan.is_empty() {
            return Err(ApplicationError::validation("Session has no text to synthesize"));
        }

        let weight = cmd.emotion_weight.unwrap_or(self.default_emotion_weight);
        if !(0.0..=1.0).contains(&weight) {
            return Err(ApplicationError::validation(format!(
                "emotion_weight must be within [0, 1], got {}",
                weight
            )));
        }

        let neutral = neutral_emotion(&cmd)?;

        let fallback_voices = plan
            .iter()
            .filter(|item| matches!(item.voice, VoiceResolution::Fallback { .. }))
            .count();
        let unavailable = plan.iter().filter(|item| item.voice.voice().is_none()).count();
        let segments = plan.len();

        if fallback_voices > 0 || unavailable > 0 {
            tracing::warn!(
                session_id = %cmd.session_id,
                fallback_voices = fallback_voices,
                unavailable = unavailable,
                "Some segments have no assigned voice"
            );
        }

        let job = SynthesisJob::new(cmd.session_id, plan, weight).with_neutral_emotion(neutral);
        let job_id = self.job_manager.submit(job)?;

        tracing::info!(
            session_id = %cmd.session_id,
            job_id = %job_id,
            segments = segments,
            "Synthesis job submitted"
        );

        Ok(SubmitSynthesisResponse {
            job_id,
            session_id: cmd.session_id,
            segments,
            fallback_voices,
            unavailable,
        })
    }
}

/// 零情感片段的控制方式；参考音频与描述文本只能二选一
fn neutral_emotion(cmd: &SubmitSynthesisCommand) -> Result<EmotionControl, ApplicationError> {
    let text = cmd
        .emotion_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let audio = cmd
        .emotion_audio
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty());

    match (audio, text) {
        (Some(_), Some(_)) => Err(ApplicationError::validation(
            "emotion_audio and emotion_text are mutually exclusive",
        )),
        (Some(path), None) => Ok(EmotionControl::ReferenceAudio(path.clone())),
        (None, Some(text)) => Ok(EmotionControl::Description(text.to_string())),
        (None, None) => Ok(EmotionControl::MatchVoiceReference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::performance::SegmentationSession;
    use crate::domain::script::{SegmenterConfig, SplitMode};
    use crate::infrastructure::adapters::FsVoiceLibrary;
    use crate::infrastructure::memory::{InMemoryJobManager, InMemorySessionManager};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_submit_builds_plan_with_fallback_voice() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();

        let sessions = Arc::new(InMemorySessionManager::new());
        let session = SegmentationSession::new("一。二。", SplitMode::Punctuation, SegmenterConfig::default());
        let id = sessions.create(session).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let jobs = Arc::new(InMemoryJobManager::new(tx));
        let handler = SubmitSynthesisHandler::new(
            sessions,
            Arc::new(FsVoiceLibrary::new(dir.path())),
            jobs.clone(),
            0.65,
        );

        let response = handler
            .handle(SubmitSynthesisCommand {
                session_id: id,
                emotion_weight: None,
                emotion_audio: None,
                emotion_text: Some("  轻声细语  ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(response.segments, 2);
        assert_eq!(response.fallback_voices, 2);
        assert_eq!(response.unavailable, 0);
        assert_eq!(rx.try_recv().unwrap(), response.job_id);

        let job = jobs.get_job(&response.job_id).unwrap();
        assert_eq!(job.emotion_weight, 0.65);
        assert_eq!(job.items[1].text, "二。");
        assert_eq!(job.neutral_emotion, EmotionControl::Description("轻声细语".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_bad_weight() {
        let dir = tempdir().unwrap();
        let sessions = Arc::new(InMemorySessionManager::new());
        let id = sessions
            .create(SegmentationSession::new("一。", SplitMode::None, SegmenterConfig::default()))
            .unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let handler = SubmitSynthesisHandler::new(
            sessions,
            Arc::new(FsVoiceLibrary::new(dir.path())),
            Arc::new(InMemoryJobManager::new(tx)),
            0.65,
        );
        let err = handler
            .handle(SubmitSynthesisCommand {
                session_id: id,
                emotion_weight: Some(1.5),
                emotion_audio: None,
                emotion_text: None,
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::ValidationError(_))));

        let err = handler
            .handle(SubmitSynthesisCommand {
                session_id: id,
                emotion_weight: None,
                emotion_audio: Some("emo/calm.wav".into()),
                emotion_text: Some("平静".to_string()),
            })
            .await;
        assert!(matches!(err, Err(ApplicationError::ValidationError(_))));
    }
}
