//! Voice Context - 音色库与音色推荐
//!
//! 音色本身由外部合成服务解释，这里只关心：
//! - 音色引用与库快照
//! - 角色到音色的推荐规则

mod library;
mod suggestion;
mod value_objects;

pub use library::{VoiceLibrary, MAX_PROMPT_VOICES};
pub use suggestion::suggest_voice;
pub use value_objects::{AudioFormat, VoiceEntry, VoiceRef};
