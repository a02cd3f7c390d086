//! Script Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::text::{dedup_delimiters, DEFAULT_DELIMITERS};

/// 默认每行目标字数（汉字单位）
pub const DEFAULT_CHARS_PER_LINE: usize = 18;

/// 文本片段 - 一次合成调用的最小单位
///
/// 不变量:
/// - index 为其在片段列表中的位置，稠密且从 0 开始
/// - text 不为空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    index: usize,
    text: String,
}

impl Segment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// 按顺序编号
    pub fn sequence<I, S>(texts: I) -> Vec<Segment>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Segment::new(index, text))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// 分段模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// 不分段，整段文本为一个片段
    None,
    /// 按配置的标点分段
    Punctuation,
    /// 引号感知的智能分段
    #[default]
    Intelligent,
}

impl SplitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Punctuation => "punctuation",
            Self::Intelligent => "intelligent",
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "punctuation" | "punct" => Ok(Self::Punctuation),
            "intelligent" | "smart" => Ok(Self::Intelligent),
            other => Err(format!("unknown split mode: {}", other)),
        }
    }
}

/// 智能分段阈值（CJK 加权单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitThresholds {
    pub natural_min: usize,
    pub natural_max: usize,
    pub soft: usize,
    pub hard: usize,
}

/// 分段配置
#[derive(Debug, Clone, PartialEq)]
pub struct SegmenterConfig {
    /// 标点模式下的分隔符（有序、去重）
    delimiters: Vec<char>,
    /// 是否把行首的闭引号粘回上一段
    pub quote_glue: bool,
    /// 每行目标字数（汉字单位）
    pub chars_per_line: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
            quote_glue: true,
            chars_per_line: DEFAULT_CHARS_PER_LINE,
        }
    }
}

impl SegmenterConfig {
    pub fn new(delimiters: impl IntoIterator<Item = char>, quote_glue: bool, chars_per_line: usize) -> Self {
        let mut delimiters = dedup_delimiters(delimiters);
        if delimiters.is_empty() {
            delimiters = DEFAULT_DELIMITERS.to_vec();
        }
        Self {
            delimiters,
            quote_glue,
            chars_per_line: chars_per_line.max(1),
        }
    }

    pub fn delimiters(&self) -> &[char] {
        &self.delimiters
    }

    pub fn is_delimiter(&self, ch: char) -> bool {
        self.delimiters.contains(&ch)
    }

    /// 由每行字数推导阈值：u = 2·cpl
    pub fn thresholds(&self) -> SplitThresholds {
        let unit = (self.chars_per_line.max(1) * 2) as f64;
        let scaled = |factor: f64| ((unit * factor).round() as usize).max(1);
        SplitThresholds {
            natural_min: scaled(0.444),
            natural_max: scaled(0.888),
            soft: scaled(1.0),
            hard: scaled(1.111),
        }
    }
}
