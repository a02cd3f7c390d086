//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod session_handlers;
mod synthesis_handlers;
mod voice_handlers;

pub use session_handlers::*;
pub use synthesis_handlers::*;
pub use voice_handlers::*;
