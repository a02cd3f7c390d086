//! 引号粘合
//!
//! 把片段开头的闭引号（以及夹在其中的空白）移回上一个片段末尾，
//! 避免出现只有一个引号的行。第一个片段保持不变。

use super::value_objects::Segment;
use crate::domain::text::is_closing_quote;

/// 对片段列表执行引号粘合并重新编号
pub fn glue(segments: &[Segment]) -> Vec<Segment> {
    let texts = segments.iter().map(|s| s.text().to_string()).collect();
    Segment::sequence(glue_texts(texts))
}

/// 对纯文本列表执行引号粘合
///
/// 幂等：粘合后的结果再粘合一次不会变化
pub fn glue_texts(texts: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(texts.len());

    for text in texts {
        let Some(last) = out.last_mut() else {
            if !text.trim().is_empty() {
                out.push(text);
            }
            continue;
        };

        let split_at = text
            .char_indices()
            .find(|&(_, c)| !(is_closing_quote(c) || c.is_whitespace()))
            .map(|(i, _)| i)
            .unwrap_or(text.len());

        let (head, rest) = text.split_at(split_at);
        let head = head.trim();
        if !head.is_empty() {
            last.push_str(head);
        }

        let rest = rest.trim();
        if !rest.is_empty() {
            out.push(rest.to_string());
        }
    }

    out
}
