//! Domain Layer - 领域层
//!
//! 纯同步逻辑，不做 I/O：
//! - text: CJK 加权计数、标点分类
//! - script: 分段器、引号粘合、长度预算器
//! - performance: 分段会话聚合根与行注解
//! - voice: 音色库与音色推荐
//! - annotation: AI 标注的提示词、解析与合并

pub mod annotation;
pub mod performance;
pub mod script;
pub mod text;
pub mod voice;
