//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chat_completion;
mod job_manager;
mod session_events;
mod session_manager;
mod state_store;
mod tts_engine;
mod voice_library;

pub use chat_completion::{ChatCompletionPort, ChatError, ChatMessage, ChatRequest, ChatRole};
pub use job_manager::{
    segment_audio_path, JobError, JobManagerPort, JobState, SegmentFailure, SynthesisJob,
};
pub use session_events::{NoopSessionEvents, SessionEventPort};
pub use session_manager::{SessionError, SessionManagerPort};
pub use state_store::{LineState, StateStoreError, StateStorePort};
pub use tts_engine::{
    ensure_emotion_mode, EmotionControl, SynthesisRequest, SynthesisResponse, TtsEnginePort,
    TtsError,
};
pub use voice_library::{VoiceLibraryError, VoiceLibraryPort};
