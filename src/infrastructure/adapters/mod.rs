//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod chat;
pub mod tts;
pub mod voice;

pub use chat::*;
pub use tts::*;
pub use voice::*;
