//! 情感向量
//!
//! 8 维，轴顺序固定：喜、怒、哀、惧、厌恶、低落、惊喜、平静。
//! 手动设置的向量原样保存（仅裁剪到 [0, 1]）；
//! AI 给出的向量需要经过 [`EmotionVector::normalize_dominant`] 收敛到单一主轴。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 情感维度数
pub const EMOTION_DIMS: usize = 8;

/// 判定为"未设置"的阈值
pub const EMOTION_EPSILON: f32 = 1e-6;

/// 旁白情感强度上限
pub const NARRATOR_INTENSITY_CAP: f32 = 0.5;

/// 只有标签、没有向量时的默认强度
pub const LABEL_INTENSITY: f32 = 0.6;

/// 情感轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionAxis {
    Joy,
    Anger,
    Sorrow,
    Fear,
    Disgust,
    Depression,
    Surprise,
    Calm,
}

impl EmotionAxis {
    pub const ALL: [EmotionAxis; EMOTION_DIMS] = [
        Self::Joy,
        Self::Anger,
        Self::Sorrow,
        Self::Fear,
        Self::Disgust,
        Self::Depression,
        Self::Surprise,
        Self::Calm,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Anger => "anger",
            Self::Sorrow => "sorrow",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
            Self::Depression => "depression",
            Self::Surprise => "surprise",
            Self::Calm => "calm",
        }
    }

    /// 界面显示用的中文标签
    pub fn label(self) -> &'static str {
        match self {
            Self::Joy => "喜",
            Self::Anger => "怒",
            Self::Sorrow => "哀",
            Self::Fear => "惧",
            Self::Disgust => "厌恶",
            Self::Depression => "低落",
            Self::Surprise => "惊喜",
            Self::Calm => "平静",
        }
    }

    /// 解析 AI 返回的情感标签（中英文均可）
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        // 先精确匹配，再按关键字包含匹配；"惊喜" 要先于 "喜" 判断
        const TABLE: &[(EmotionAxis, &[&str])] = &[
            (EmotionAxis::Surprise, &["惊喜", "惊讶", "吃惊", "震惊", "surprise", "surprised", "amazed"]),
            (EmotionAxis::Depression, &["低落", "沮丧", "失落", "消沉", "depressed", "depression", "melancholy"]),
            (EmotionAxis::Disgust, &["厌恶", "恶心", "嫌弃", "disgust", "disgusted"]),
            (EmotionAxis::Joy, &["喜", "高兴", "开心", "快乐", "兴奋", "joy", "happy", "excited"]),
            (EmotionAxis::Anger, &["怒", "生气", "愤怒", "恼火", "anger", "angry", "furious"]),
            (EmotionAxis::Sorrow, &["哀", "悲伤", "伤心", "难过", "sorrow", "sad", "grief"]),
            (EmotionAxis::Fear, &["惧", "害怕", "恐惧", "紧张", "fear", "afraid", "scared", "nervous"]),
            (EmotionAxis::Calm, &["平静", "冷静", "平淡", "中性", "calm", "neutral", "peaceful"]),
        ];

        if let Some(axis) = Self::ALL.iter().find(|a| a.as_str() == label || a.label() == label) {
            return Some(*axis);
        }
        TABLE
            .iter()
            .find(|(_, words)| words.iter().any(|w| label.contains(w)))
            .map(|(axis, _)| *axis)
    }
}

impl fmt::Display for EmotionAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 8 维情感向量，每个分量在 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionVector([f32; EMOTION_DIMS]);

impl EmotionVector {
    pub fn zero() -> Self {
        Self::default()
    }

    /// 创建向量，非有限值视为 0，其余裁剪到 [0, 1]
    pub fn new(values: [f32; EMOTION_DIMS]) -> Self {
        Self(values.map(clamp_unit))
    }

    /// 宽松地从任意长度的切片构造，缺失补 0，多余截断
    pub fn from_slice(values: &[f64]) -> Self {
        let mut out = [0.0f32; EMOTION_DIMS];
        for (slot, v) in out.iter_mut().zip(values) {
            *slot = clamp_unit(*v as f32);
        }
        Self(out)
    }

    /// 单轴向量
    pub fn single(axis: EmotionAxis, intensity: f32) -> Self {
        let mut out = [0.0f32; EMOTION_DIMS];
        out[axis.index()] = clamp_unit(intensity);
        Self(out)
    }

    pub fn values(&self) -> &[f32; EMOTION_DIMS] {
        &self.0
    }

    pub fn get(&self, axis: EmotionAxis) -> f32 {
        self.0[axis.index()]
    }

    /// Σ|v|
    pub fn sum(&self) -> f32 {
        self.0.iter().map(|v| v.abs()).sum()
    }

    /// Σ|v| ≤ 1e-6 视为未设置
    pub fn is_zero(&self) -> bool {
        self.sum() <= EMOTION_EPSILON
    }

    /// 最大分量所在的轴；并列时取靠前的轴；全零返回 None
    pub fn dominant(&self) -> Option<(EmotionAxis, f32)> {
        let mut best: Option<(EmotionAxis, f32)> = None;
        for axis in EmotionAxis::ALL {
            let value = self.get(axis);
            if value <= EMOTION_EPSILON {
                continue;
            }
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((axis, value)),
            }
        }
        best
    }

    /// 只保留主轴，其余清零；可选地限制主轴强度
    pub fn normalize_dominant(&self, cap: Option<f32>) -> Self {
        match self.dominant() {
            Some((axis, value)) => {
                let value = cap.map_or(value, |c| value.min(c));
                Self::single(axis, value)
            }
            None => Self::zero(),
        }
    }

    /// 形如 "Σ=0.60" 的摘要
    pub fn summary(&self) -> String {
        format!("Σ={:.2}", self.sum())
    }
}

impl From<EmotionAxis> for EmotionVector {
    fn from(axis: EmotionAxis) -> Self {
        Self::single(axis, LABEL_INTENSITY)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// AI 情感收敛：主轴保留，旁白强度不超过 0.5
///
/// 向量为空时退回到标签推导的单轴向量
pub fn normalize_ai_emotion(
    vector: Option<EmotionVector>,
    label: Option<&str>,
    is_narrator: bool,
) -> EmotionVector {
    let base = vector
        .filter(|v| !v.is_zero())
        .or_else(|| label.and_then(EmotionAxis::from_label).map(EmotionVector::from))
        .unwrap_or_default();

    let cap = is_narrator.then_some(NARRATOR_INTENSITY_CAP);
    base.normalize_dominant(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_values() {
        let v = EmotionVector::new([1.5, -0.2, f32::NAN, 0.3, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(v.values(), &[1.0, 0.0, 0.0, 0.3, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_slice_pads_and_truncates() {
        let short = EmotionVector::from_slice(&[0.5]);
        assert_eq!(short.get(EmotionAxis::Joy), 0.5);
        assert_eq!(short.sum(), 0.5);

        let long = EmotionVector::from_slice(&[0.0; 12]);
        assert!(long.is_zero());
    }

    #[test]
    fn test_dominant_prefers_first_on_tie() {
        let v = EmotionVector::new([0.0, 0.4, 0.4, 0.0, 0.0, 0.0, 0.0, 0.1]);
        assert_eq!(v.dominant(), Some((EmotionAxis::Anger, 0.4)));
    }

    #[test]
    fn test_normalize_keeps_single_axis() {
        let v = EmotionVector::new([0.2, 0.0, 0.0, 0.9, 0.0, 0.3, 0.0, 0.0]);
        let n = v.normalize_dominant(None);
        assert_eq!(n, EmotionVector::single(EmotionAxis::Fear, 0.9));
    }

    #[test]
    fn test_narrator_is_capped() {
        let v = EmotionVector::new([0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let n = normalize_ai_emotion(Some(v), None, true);
        assert_eq!(n, EmotionVector::single(EmotionAxis::Sorrow, 0.5));

        let d = normalize_ai_emotion(Some(v), None, false);
        assert_eq!(d, EmotionVector::single(EmotionAxis::Sorrow, 0.8));
    }

    #[test]
    fn test_label_fallback() {
        let n = normalize_ai_emotion(None, Some("高兴"), false);
        assert_eq!(n, EmotionVector::single(EmotionAxis::Joy, LABEL_INTENSITY));

        let z = normalize_ai_emotion(Some(EmotionVector::zero()), Some("surprised"), false);
        assert_eq!(z.dominant().map(|(a, _)| a), Some(EmotionAxis::Surprise));

        assert!(normalize_ai_emotion(None, Some("???"), false).is_zero());
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(EmotionAxis::from_label("惊喜"), Some(EmotionAxis::Surprise));
        assert_eq!(EmotionAxis::from_label("喜"), Some(EmotionAxis::Joy));
        assert_eq!(EmotionAxis::from_label("Neutral"), Some(EmotionAxis::Calm));
        assert_eq!(EmotionAxis::from_label("depression"), Some(EmotionAxis::Depression));
        assert_eq!(EmotionAxis::from_label(""), None);
    }

    #[test]
    fn test_summary_format() {
        let v = EmotionVector::new([0.3, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(v.summary(), "Σ=0.60");
    }
}
