//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod annotation_commands;
mod session_commands;
mod synthesis_commands;

pub mod handlers;

pub use annotation_commands::*;
pub use session_commands::*;
pub use synthesis_commands::*;
