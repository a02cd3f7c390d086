//! Performance Context - 演绎参数
//!
//! 分段会话聚合根，以及按行索引的角色/情感/语速注解。

mod edit;
mod emotion;
mod errors;
mod role;
mod session;
mod speed;
mod store;
mod value_objects;

pub use edit::SessionEdit;
pub use emotion::{
    normalize_ai_emotion, EmotionAxis, EmotionVector, EMOTION_DIMS, EMOTION_EPSILON,
    LABEL_INTENSITY, NARRATOR_INTENSITY_CAP,
};
pub use errors::PerformanceError;
pub use role::{
    canonical_role_name, is_narrator, FallbackReason, Role, RoleTable, VoiceResolution,
    NARRATOR_ROLE, UNASSIGNED_ROLE,
};
pub use session::SegmentationSession;
pub use speed::SpeedFactor;
pub use store::{renumber, EditOp, EmotionStore, IndexedStore, RoleAssignments, SpeedStore};
pub use value_objects::{EditOutcome, LineStats, PerformanceItem, SessionId, SessionStats};
