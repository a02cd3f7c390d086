//! Session Commands - 分段会话相关命令

use serde::Serialize;

use crate::domain::performance::{EditOutcome, SessionEdit, SessionId};
use crate::domain::script::SplitMode;

/// 创建会话命令
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub text: String,
    /// 缺省时使用配置中的分段模式
    pub mode: Option<SplitMode>,
    /// 从之前保存过的会话恢复行注解
    pub restore_from: Option<SessionId>,
}

/// 创建会话响应
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
    pub version: u64,
    pub mode: SplitMode,
    pub segments: Vec<String>,
}

/// 重新分段命令
#[derive(Debug, Clone)]
pub struct ResegmentCommand {
    pub session_id: SessionId,
    pub text: Option<String>,
    pub mode: Option<SplitMode>,
}

/// 编辑命令
#[derive(Debug, Clone)]
pub struct EditSessionCommand {
    pub session_id: SessionId,
    pub edit: SessionEdit,
    /// 客户端看到的版本；给出时必须与当前版本一致
    pub expected_version: Option<u64>,
}

/// 重新分段 / 编辑响应
#[derive(Debug, Clone, Serialize)]
pub struct EditSessionResponse {
    pub session_id: SessionId,
    pub version: u64,
    pub outcome: EditOutcome,
}

/// 保存会话命令（角色表 + 行注解）
#[derive(Debug, Clone)]
pub struct SaveSessionCommand {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveSessionResponse {
    pub session_id: SessionId,
    pub roles: usize,
    pub emotions: usize,
    pub speeds: usize,
}

/// 关闭会话命令
#[derive(Debug, Clone)]
pub struct CloseSessionCommand {
    pub session_id: SessionId,
}

/// 关闭会话响应
#[derive(Debug, Clone, Serialize)]
pub struct CloseSessionResponse {
    pub session_id: SessionId,
    pub cancelled_jobs: usize,
}
