//! Performance Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{EmotionVector, SpeedFactor, VoiceResolution};
use crate::domain::text::LengthWarning;

/// 会话唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// 单行统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStats {
    pub index: usize,
    pub han_count: usize,
    pub warning: LengthWarning,
}

/// 会话统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_lines: usize,
    /// 非空白字符总数
    pub total_chars: usize,
    pub soft_warnings: usize,
    pub hard_warnings: usize,
    pub lines: Vec<LineStats>,
}

/// 一行的完整演绎参数（交给合成服务）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceItem {
    pub index: usize,
    pub text: String,
    pub role: String,
    pub voice: VoiceResolution,
    pub emotion: EmotionVector,
    pub speed: SpeedFactor,
}

/// 编辑结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    /// 编辑后的行数
    pub line_count: usize,
    /// 受影响的行数（批量操作、提交时有意义）
    pub affected: usize,
}
