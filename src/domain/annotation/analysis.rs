//! AI 分析结果
//!
//! `Raw*` 结构对应模型回复中的 JSON 对象，字段都是宽松可选的；
//! 经过校对（reconcile）之后才得到强类型的 [`AnalysisResult`]。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::performance::{EmotionVector, SpeedFactor};
use crate::domain::voice::VoiceRef;

// ============================================================================
// 模型回复（宽松）
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub roles: Vec<RawRole>,
    #[serde(default)]
    pub segments: Vec<RawSegment>,
    #[serde(default)]
    pub assignments: Vec<RawAssignment>,
}

impl RawAnalysis {
    /// 既没有片段也没有逐行分配
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.assignments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "suggestedVoice", alias = "voice")]
    pub suggested_voice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSegment {
    pub text: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "emotionLabel", alias = "emotion_label")]
    pub emotion: Option<String>,
    #[serde(default, alias = "emotionVector")]
    pub emotion_vector: Option<Value>,
    #[serde(default, alias = "speed", alias = "speakingSpeed")]
    pub speaking_speed: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAssignment {
    /// 从 1 开始的行号
    #[serde(default)]
    pub line: Option<Value>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "emotionLabel", alias = "emotion_label")]
    pub emotion: Option<String>,
    #[serde(default, alias = "emotionVector")]
    pub emotion_vector: Option<Value>,
    #[serde(default, alias = "speed", alias = "speakingSpeed")]
    pub speaking_speed: Option<Value>,
}

impl RawAssignment {
    /// 行号（允许数字或数字字符串）
    pub fn line_number(&self) -> Option<usize> {
        match self.line.as_ref()? {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// 宽松解析情感向量：数组中的数字或数字字符串，其余按 0 处理
pub fn lenient_vector(value: Option<&Value>) -> Option<EmotionVector> {
    let items = value?.as_array()?;
    let numbers: Vec<f64> = items.iter().map(|v| lenient_number(v).unwrap_or(0.0)).collect();
    Some(EmotionVector::from_slice(&numbers))
}

/// 宽松解析语速
pub fn lenient_speed(value: Option<&Value>) -> Option<SpeedFactor> {
    value
        .and_then(lenient_number)
        .map(|v| SpeedFactor::new(v as f32))
}

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches(['x', 'X']).parse().ok(),
        _ => None,
    }
}

// ============================================================================
// 校对后的结果（强类型）
// ============================================================================

/// 片段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Dialogue,
    Narration,
}

impl SegmentKind {
    /// 未知或缺失的类型按对白处理（保留 AI 给出的角色）
    pub fn parse(kind: Option<&str>) -> Self {
        match kind.map(|k| k.trim().to_lowercase()).as_deref() {
            Some("narration" | "narrative" | "narrator" | "旁白" | "叙述") => Self::Narration,
            _ => Self::Dialogue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRole {
    pub name: String,
    pub description: Option<String>,
    pub suggested_voice: Option<VoiceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzedSegment {
    pub text: String,
    pub role: String,
    pub kind: SegmentKind,
    pub emotion_label: Option<String>,
    pub emotion: EmotionVector,
    pub speed: SpeedFactor,
}

/// 单行注解
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAnnotation {
    pub role: String,
    pub emotion: EmotionVector,
    pub speed: SpeedFactor,
}

/// 一次标注的最终结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub roles: Vec<AnalysisRole>,
    pub segments: Vec<AnalyzedSegment>,
    /// 由 segments 推导：片段索引 → 注解
    pub assignments: BTreeMap<usize, LineAnnotation>,
    /// 使用了启发式兜底的批次数
    pub heuristic_batches: usize,
}

impl AnalysisResult {
    pub fn derive_assignments(segments: &[AnalyzedSegment]) -> BTreeMap<usize, LineAnnotation> {
        segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                (
                    i,
                    LineAnnotation {
                        role: s.role.clone(),
                        emotion: s.emotion,
                        speed: s.speed,
                    },
                )
            })
            .collect()
    }
}
