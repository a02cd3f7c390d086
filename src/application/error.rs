//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{
    ChatError, JobError, SessionError, StateStoreError, TtsError, VoiceLibraryError,
};
use crate::domain::performance::PerformanceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建业务规则违反错误
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<PerformanceError> for ApplicationError {
    fn from(err: PerformanceError) -> Self {
        match err {
            PerformanceError::UnknownRole(_) | PerformanceError::InvalidRoleName(_) => {
                Self::BusinessRuleViolation(err.to_string())
            }
            _ => Self::ValidationError(err.to_string()),
        }
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::not_found("Session", id),
            SessionError::AlreadyExists(_)
            | SessionError::VersionConflict { .. }
            | SessionError::AnnotationInProgress(_) => Self::InvalidState(err.to_string()),
        }
    }
}

impl From<ChatError> for ApplicationError {
    fn from(err: ChatError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<TtsError> for ApplicationError {
    fn from(err: TtsError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

impl From<StateStoreError> for ApplicationError {
    fn from(err: StateStoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<VoiceLibraryError> for ApplicationError {
    fn from(err: VoiceLibraryError) -> Self {
        match err {
            VoiceLibraryError::NotFound(id) => Self::not_found("Voice", id),
            VoiceLibraryError::IoError(msg) => Self::StorageError(msg),
        }
    }
}

impl From<JobError> for ApplicationError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::NotFound(id) => Self::not_found("Job", id),
            JobError::QueueUnavailable(_) => Self::InternalError(err.to_string()),
        }
    }
}
