//! 字符计数器
//!
//! CJK 加权长度：汉字（U+4E00–U+9FFF）计 2，其余字符计 1。
//! 所有分段阈值都以加权长度为单位。

use serde::Serialize;

/// 是否为 CJK 统一表意文字（基本区）
#[inline]
pub fn is_cjk(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
}

/// 单个字符的加权长度
#[inline]
pub fn char_weight(ch: char) -> usize {
    if is_cjk(ch) {
        2
    } else {
        1
    }
}

/// 文本的 CJK 加权长度
pub fn weighted_length(text: &str) -> usize {
    text.chars().map(char_weight).sum()
}

/// 估算汉字数量：ceil(加权长度 / 2)
pub fn han_count(text: &str) -> usize {
    weighted_length(text).div_ceil(2)
}

/// 行长度告警级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthWarning {
    None,
    /// 达到上限的 90%
    Soft,
    /// 超过上限
    Hard,
}

/// 按每行字数上限（汉字单位）计算告警级别
pub fn length_warning(text: &str, limit: usize) -> LengthWarning {
    if limit == 0 {
        return LengthWarning::None;
    }
    let count = han_count(text);
    if count > limit {
        LengthWarning::Hard
    } else if count * 10 >= limit * 9 {
        LengthWarning::Soft
    } else {
        LengthWarning::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_length_mixed() {
        assert_eq!(weighted_length("中文ab"), 6);
        assert_eq!(han_count("中文ab"), 3);
    }

    #[test]
    fn test_han_count_rounds_up() {
        assert_eq!(han_count("a"), 1);
        assert_eq!(han_count(""), 0);
        assert_eq!(han_count("abc"), 2);
    }

    #[test]
    fn test_cjk_punctuation_is_not_ideograph() {
        assert!(!is_cjk('。'));
        assert!(!is_cjk('“'));
        assert!(is_cjk('好'));
    }

    #[test]
    fn test_length_warning_levels() {
        assert_eq!(length_warning("一二三四五", 10), LengthWarning::None);
        assert_eq!(length_warning("一二三四五六七八九", 10), LengthWarning::Soft);
        assert_eq!(length_warning("一二三四五六七八九十", 10), LengthWarning::Soft);
        assert_eq!(length_warning("一二三四五六七八九十一", 10), LengthWarning::Hard);
        assert_eq!(length_warning("任何内容", 0), LengthWarning::None);
    }
}
