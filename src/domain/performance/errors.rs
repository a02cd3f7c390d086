//! Performance Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PerformanceError {
    #[error("行索引越界: {index}（共 {len} 行）")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("无效的移动: {from} -> {to}（共 {len} 行）")]
    InvalidMove { from: usize, to: usize, len: usize },

    #[error("光标位置越界: 第 {index} 行，位置 {caret}")]
    InvalidCaret { index: usize, caret: usize },

    #[error("第一行不能向上合并")]
    CannotMergeFirstLine,

    #[error("角色不存在: {0}")]
    UnknownRole(String),

    #[error("无效的角色名: {0}")]
    InvalidRoleName(String),
}
