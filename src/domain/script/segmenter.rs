//! 文本分割器
//!
//! 三种模式：
//! - none: 整段为一个片段
//! - punctuation: 按配置的分隔符单遍扫描，连续分隔符与紧随的闭引号并入当前片段
//! - intelligent: 引号感知的流式扫描，引号内的句末/停顿标点不触发分割，
//!   超过软上限时向后回溯寻找切点，超过硬上限时强制切分
//!
//! 换行在 punctuation / intelligent 模式下总是片段边界。

use super::quote_glue::glue_texts;
use super::value_objects::{Segment, SegmenterConfig, SplitMode};
use crate::domain::text::{
    char_weight, is_ambiguous_quote, is_cjk, is_closing_quote, is_pause_mark,
    is_sentence_terminator, weighted_length, QuoteStack,
};

/// 回溯窗口（字符数）
const BACKTRACK_TERMINATOR: usize = 15;
const BACKTRACK_PAUSE: usize = 12;
const BACKTRACK_CLOSING: usize = 8;
const BACKTRACK_BOUNDARY: usize = 10;

/// 对文本进行分段
///
/// 纯函数、确定性，不会失败；空白输入返回空列表。
/// 启用 quote_glue 时最后执行一次引号粘合。
pub fn segment(text: &str, mode: SplitMode, config: &SegmenterConfig) -> Vec<Segment> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let pieces = match mode {
        SplitMode::None => vec![trimmed.to_string()],
        SplitMode::Punctuation => split_by_punctuation(trimmed, config),
        SplitMode::Intelligent => split_intelligent(trimmed, config),
    };

    let pieces = if config.quote_glue {
        glue_texts(pieces)
    } else {
        pieces
    };

    tracing::debug!(
        mode = %mode,
        input_chars = trimmed.chars().count(),
        segments = pieces.len(),
        "Text segmented"
    );

    Segment::sequence(pieces)
}

/// 标点模式
fn split_by_punctuation(text: &str, config: &SegmenterConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let is_filler =
        |c: char| config.is_delimiter(c) || is_closing_quote(c) || c.is_whitespace();

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        i += 1;

        if ch == '\n' {
            push_segment(&mut segments, &current, is_filler);
            current.clear();
            continue;
        }

        current.push(ch);

        if config.is_delimiter(ch) {
            // 吸收连续分隔符（如 "？！"、"……"）
            while i < chars.len() && config.is_delimiter(chars[i]) {
                current.push(chars[i]);
                i += 1;
            }
            if config.quote_glue {
                while i < chars.len() && is_closing_quote(chars[i]) {
                    current.push(chars[i]);
                    i += 1;
                }
            }
            push_segment(&mut segments, &current, is_filler);
            current.clear();
        }
    }
    push_segment(&mut segments, &current, is_filler);

    reflow_oversized(segments, config)
}

/// 超过硬上限的标点片段再走一遍智能分割
fn reflow_oversized(segments: Vec<String>, config: &SegmenterConfig) -> Vec<String> {
    let hard = config.thresholds().hard;
    let mut out = Vec::with_capacity(segments.len());
    for seg in segments {
        if weighted_length(&seg) > hard {
            out.extend(split_intelligent(&seg, config));
        } else {
            out.push(seg);
        }
    }
    out
}

/// 智能模式
fn split_intelligent(text: &str, config: &SegmenterConfig) -> Vec<String> {
    let limits = config.thresholds();
    let chars: Vec<char> = text.chars().collect();
    let is_filler = |c: char| {
        is_sentence_terminator(c) || is_pause_mark(c) || is_closing_quote(c) || c.is_whitespace()
    };

    let mut segments: Vec<String> = Vec::new();
    let mut buf: Vec<char> = Vec::new();
    let mut weight = 0usize;
    let mut quotes = QuoteStack::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch == '\n' {
            flush(&mut segments, &mut buf, is_filler);
            weight = 0;
            quotes.clear();
            continue;
        }

        let prev = buf.last().copied();
        let next = chars.get(i + 1).copied();

        buf.push(ch);
        weight += char_weight(ch);

        // 句末标点后出现的 ASCII 引号视为闭引号，而不是新的开引号
        let stray_close = is_ambiguous_quote(ch)
            && !quotes.is_open()
            && prev.is_some_and(is_sentence_terminator);
        if !stray_close {
            quotes.feed(ch);
        }

        if !quotes.is_open() {
            let next_is_closing = next.is_some_and(is_closing_quote);

            if is_closing_quote(ch) {
                if ends_with_terminated_quote(&buf) && !next_is_closing {
                    flush(&mut segments, &mut buf, is_filler);
                    weight = 0;
                    continue;
                }
            } else if is_sentence_terminator(ch) && !is_decimal_point(&chars, i) {
                let continues = next.is_some_and(|n| is_sentence_terminator(n)) || next_is_closing;
                if !continues {
                    flush(&mut segments, &mut buf, is_filler);
                    weight = 0;
                    quotes.clear();
                    continue;
                }
            } else if is_pause_mark(ch)
                && (limits.natural_min..=limits.natural_max).contains(&weight)
            {
                flush(&mut segments, &mut buf, is_filler);
                weight = 0;
                continue;
            }
        }

        if weight >= limits.soft {
            if let Some(cut) = find_soft_cut(&buf) {
                let rest = buf.split_off(cut);
                flush(&mut segments, &mut buf, is_filler);
                buf = rest;
                weight = buf.iter().copied().map(char_weight).sum();
                quotes.rebuild(&buf);
            } else if weight >= limits.hard {
                flush(&mut segments, &mut buf, is_filler);
                weight = 0;
                quotes.clear();
            }
        }
    }
    flush(&mut segments, &mut buf, is_filler);

    segments
}

/// 两个数字之间的 '.' 是小数点
fn is_decimal_point(chars: &[char], i: usize) -> bool {
    chars[i] == '.'
        && i > 0
        && chars[i - 1].is_ascii_digit()
        && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

/// 缓冲区以 "句末标点 + 闭引号串" 结尾
fn ends_with_terminated_quote(buf: &[char]) -> bool {
    buf.iter()
        .rev()
        .find(|&&c| !is_closing_quote(c))
        .is_some_and(|&c| is_sentence_terminator(c))
}

/// 软上限回溯：句末标点 > 停顿标点 > 闭引号 > 空白或中英文边界
///
/// 返回切点（左半部分的长度）
fn find_soft_cut(buf: &[char]) -> Option<usize> {
    let n = buf.len();
    let search_after = |span: usize, pred: fn(char) -> bool| -> Option<usize> {
        let start = n.saturating_sub(span);
        (start..n).rev().find(|&k| pred(buf[k])).map(|k| k + 1)
    };

    search_after(BACKTRACK_TERMINATOR, is_sentence_terminator)
        .or_else(|| search_after(BACKTRACK_PAUSE, is_pause_mark))
        .or_else(|| search_after(BACKTRACK_CLOSING, is_closing_quote))
        .or_else(|| {
            let start = n.saturating_sub(BACKTRACK_BOUNDARY).max(1);
            (start..n).rev().find_map(|k| {
                if buf[k].is_whitespace() {
                    Some(k + 1)
                } else if is_script_boundary(buf[k - 1], buf[k]) {
                    Some(k)
                } else {
                    None
                }
            })
        })
}

/// 汉字与 ASCII 字母数字之间的边界
fn is_script_boundary(a: char, b: char) -> bool {
    (is_cjk(a) && b.is_ascii_alphanumeric()) || (a.is_ascii_alphanumeric() && is_cjk(b))
}

fn flush(segments: &mut Vec<String>, buf: &mut Vec<char>, is_filler: impl Fn(char) -> bool) {
    let text: String = buf.drain(..).collect();
    push_segment(segments, &text, is_filler);
}

/// 追加片段；只含标点/闭引号的片段并入上一个片段
fn push_segment(segments: &mut Vec<String>, text: &str, is_filler: impl Fn(char) -> bool) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    if trimmed.chars().all(&is_filler) {
        if let Some(last) = segments.last_mut() {
            last.push_str(trimmed);
            return;
        }
    }
    segments.push(trimmed.to_string());
}
