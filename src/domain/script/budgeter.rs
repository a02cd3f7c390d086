//! 长度预算器
//!
//! 把一段文本切成加权长度不超过 2·max_cjk_len 的若干片段，
//! 切点优先落在句末标点之后，其次停顿标点之后，最后才在当前位置硬切。

use crate::domain::text::{char_weight, is_pause_mark, is_sentence_terminator};

/// 重新按长度预算切分
///
/// 返回的片段均已去除首尾空白，空片段被丢弃
pub fn rebudget(text: &str, max_cjk_len: usize) -> Vec<String> {
    let limit = max_cjk_len.max(1) * 2;
    let mut pieces = Vec::new();
    let mut buf: Vec<char> = Vec::new();
    let mut weight = 0usize;

    for ch in text.chars() {
        let w = char_weight(ch);
        if !buf.is_empty() && weight + w > limit {
            cut(&mut buf, &mut weight, &mut pieces);
        }

        buf.push(ch);
        weight += w;

        if weight >= limit {
            cut(&mut buf, &mut weight, &mut pieces);
        }
    }
    emit(&mut pieces, buf.into_iter().collect());

    pieces
}

/// 在缓冲区中选择切点，输出左半部分，保留右半部分
fn cut(buf: &mut Vec<char>, weight: &mut usize, pieces: &mut Vec<String>) {
    let at = buf
        .iter()
        .rposition(|&c| is_sentence_terminator(c))
        .or_else(|| buf.iter().rposition(|&c| is_pause_mark(c)))
        .map(|i| i + 1)
        .unwrap_or(buf.len());

    let rest = buf.split_off(at);
    emit(pieces, buf.drain(..).collect());
    *buf = rest;
    *weight = buf.iter().copied().map(char_weight).sum();
}

fn emit(pieces: &mut Vec<String>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text::weighted_length;

    #[test]
    fn test_rebudget_long_cjk_run() {
        let text = "字".repeat(60);
        let pieces = rebudget(&text, 25);
        assert!(pieces.len() >= 3);
        assert!(pieces.iter().all(|p| weighted_length(p) <= 50));
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_rebudget_prefers_terminator() {
        let text = "第一句话说完了。第二句还在继续说下去没有停";
        let pieces = rebudget(text, 10);
        assert_eq!(pieces[0], "第一句话说完了。");
        assert!(pieces.iter().all(|p| weighted_length(p) <= 20));
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_rebudget_falls_back_to_pause() {
        let text = "我们走了很远，终于看见了那座山";
        let pieces = rebudget(text, 8);
        assert_eq!(pieces[0], "我们走了很远，");
        assert!(pieces.iter().all(|p| weighted_length(p) <= 16));
    }

    #[test]
    fn test_rebudget_short_text_untouched() {
        assert_eq!(rebudget("  短句。 ", 25), vec!["短句。".to_string()]);
        assert!(rebudget("   ", 25).is_empty());
    }
}
