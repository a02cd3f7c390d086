//! State Store Port - 角色表与行注解的持久化

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::performance::{EmotionVector, SessionId, SpeedFactor};

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 一个会话的行注解快照（键为十进制行号）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineState {
    pub emotions: BTreeMap<String, EmotionVector>,
    pub speeds: BTreeMap<String, SpeedFactor>,
}

/// State Store Port
#[async_trait]
pub trait StateStorePort: Send + Sync {
    /// 保存角色表 {roleName: voiceRef}
    async fn save_roles(&self, roles: &BTreeMap<String, String>) -> Result<(), StateStoreError>;

    /// 读取角色表；从未保存过时返回空表
    async fn load_roles(&self) -> Result<BTreeMap<String, String>, StateStoreError>;

    async fn save_line_state(&self, id: &SessionId, state: &LineState) -> Result<(), StateStoreError>;

    async fn load_line_state(&self, id: &SessionId) -> Result<Option<LineState>, StateStoreError>;

    async fn remove_line_state(&self, id: &SessionId) -> Result<(), StateStoreError>;
}
