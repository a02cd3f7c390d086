//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod annotation_handlers;
mod session_command_handlers;
mod synthesis_handlers;

pub use annotation_handlers::*;
pub use session_command_handlers::*;
pub use synthesis_handlers::*;
