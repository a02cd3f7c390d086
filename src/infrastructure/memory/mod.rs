//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionManager 和 JobManager，管理分段会话和合成任务的内存状态

mod job_manager;
mod session_manager;

pub use job_manager::InMemoryJobManager;
pub use session_manager::InMemorySessionManager;
