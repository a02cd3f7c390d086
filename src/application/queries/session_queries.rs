//! Session Queries - 分段会话查询

use crate::domain::performance::SessionId;

/// 获取会话详情（行、注解、统计）
#[derive(Debug, Clone)]
pub struct GetSession {
    pub session_id: SessionId,
}

/// 获取演绎计划
#[derive(Debug, Clone)]
pub struct GetPerformancePlan {
    pub session_id: SessionId,
}
