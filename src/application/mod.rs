//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ChatCompletion、TtsEngine、SessionManager、JobManager 等）
//! - annotator: AI 标注编排（分批、解析、合并）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod annotator;
pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use annotator::{AiAnnotator, AnnotatorSettings};

pub use commands::{
    // Session commands
    CloseSessionCommand,
    CloseSessionResponse,
    CreateSessionCommand,
    CreateSessionResponse,
    EditSessionCommand,
    EditSessionResponse,
    ResegmentCommand,
    SaveSessionCommand,
    SaveSessionResponse,
    // Annotation commands
    AnnotateSessionCommand,
    AnnotateSessionResponse,
    AnnotationAccepted,
    // Synthesis commands
    SubmitSynthesisCommand,
    SubmitSynthesisResponse,
    // Handlers
    handlers::{
        AnnotateSessionHandler, CloseSessionHandler, CreateSessionHandler, EditSessionHandler,
        ResegmentHandler, SaveSessionHandler, SessionDefaults, SubmitSynthesisHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Chat completion
    ChatCompletionPort,
    ChatError,
    ChatMessage,
    ChatRequest,
    ChatRole,
    // Synthesis jobs
    segment_audio_path,
    JobError,
    JobManagerPort,
    JobState,
    SegmentFailure,
    SynthesisJob,
    // Session
    NoopSessionEvents,
    SessionError,
    SessionEventPort,
    SessionManagerPort,
    // Persistence
    LineState,
    StateStoreError,
    StateStorePort,
    // TTS engine
    ensure_emotion_mode,
    EmotionControl,
    SynthesisRequest,
    SynthesisResponse,
    TtsEnginePort,
    TtsError,
    // Voice library
    VoiceLibraryError,
    VoiceLibraryPort,
};

pub use queries::{
    GetPerformancePlan,
    GetSegmentAudio,
    GetSession,
    GetSynthesisJob,
    ListVoices,
    // Handlers
    handlers::{
        GetPerformancePlanHandler, GetSegmentAudioHandler, GetSessionHandler,
        GetSynthesisJobHandler, LineView, ListVoicesHandler, RoleView, SessionView,
        SynthesisJobResponse, VoiceResponse,
    },
};
