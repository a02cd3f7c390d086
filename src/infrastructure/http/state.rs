//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    // Command handlers
    AiAnnotator, AnnotateSessionHandler, CloseSessionHandler, CreateSessionHandler,
    EditSessionHandler, ResegmentHandler, SaveSessionHandler, SessionDefaults,
    SubmitSynthesisHandler,
    // Query handlers
    GetPerformancePlanHandler, GetSegmentAudioHandler, GetSessionHandler, GetSynthesisJobHandler,
    ListVoicesHandler,
    // Ports
    JobManagerPort, SessionManagerPort, StateStorePort, VoiceLibraryPort,
};
use crate::infrastructure::events::EventPublisher;

/// 构建 AppState 所需的依赖
pub struct AppDeps {
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub job_manager: Arc<dyn JobManagerPort>,
    pub state_store: Arc<dyn StateStorePort>,
    pub voice_library: Arc<dyn VoiceLibraryPort>,
    pub annotator: Arc<AiAnnotator>,
    pub event_publisher: Arc<EventPublisher>,
    pub session_defaults: SessionDefaults,
    pub emotion_weight: f32,
    pub audio_dir: PathBuf,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub voice_library: Arc<dyn VoiceLibraryPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_session_handler: CreateSessionHandler,
    pub resegment_handler: ResegmentHandler,
    pub edit_session_handler: EditSessionHandler,
    pub save_session_handler: SaveSessionHandler,
    pub close_session_handler: CloseSessionHandler,
    pub annotate_handler: Arc<AnnotateSessionHandler>,
    pub submit_synthesis_handler: SubmitSynthesisHandler,

    // ========== Query Handlers ==========
    pub get_session_handler: GetSessionHandler,
    pub get_plan_handler: GetPerformancePlanHandler,
    pub list_voices_handler: ListVoicesHandler,
    pub get_job_handler: GetSynthesisJobHandler,
    pub get_audio_handler: GetSegmentAudioHandler,
}

impl AppState {
    pub fn new(deps: AppDeps) -> Self {
        let AppDeps {
            session_manager,
            job_manager,
            state_store,
            voice_library,
            annotator,
            event_publisher,
            session_defaults,
            emotion_weight,
            audio_dir,
        } = deps;

        Self {
            // Ports
            session_manager: session_manager.clone(),
            voice_library: voice_library.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            create_session_handler: CreateSessionHandler::new(
                session_manager.clone(),
                state_store.clone(),
                session_defaults,
            ),
            resegment_handler: ResegmentHandler::new(session_manager.clone()),
            edit_session_handler: EditSessionHandler::new(session_manager.clone()),
            save_session_handler: SaveSessionHandler::new(
                session_manager.clone(),
                state_store.clone(),
            ),
            close_session_handler: CloseSessionHandler::new(
                session_manager.clone(),
                job_manager.clone(),
                event_publisher.clone(),
            ),
            annotate_handler: Arc::new(AnnotateSessionHandler::new(
                session_manager.clone(),
                voice_library.clone(),
                annotator,
                event_publisher.clone(),
            )),
            submit_synthesis_handler: SubmitSynthesisHandler::new(
                session_manager.clone(),
                voice_library.clone(),
                job_manager.clone(),
                emotion_weight,
            ),

            // Query handlers
            get_session_handler: GetSessionHandler::new(
                session_manager.clone(),
                voice_library.clone(),
            ),
            get_plan_handler: GetPerformancePlanHandler::new(
                session_manager.clone(),
                voice_library.clone(),
            ),
            list_voices_handler: ListVoicesHandler::new(voice_library),
            get_job_handler: GetSynthesisJobHandler::new(job_manager),
            get_audio_handler: GetSegmentAudioHandler::new(audio_dir),
        }
    }
}
