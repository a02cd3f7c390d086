//! 标点与引号字符分类

/// 默认标点分隔符（有序，中英文句末与停顿标点）
pub const DEFAULT_DELIMITERS: &[char] = &[
    '。', '！', '？', '；', '，', '、', '…', '.', '!', '?', ';', ',',
];

/// 句末标点
#[inline]
pub fn is_sentence_terminator(ch: char) -> bool {
    matches!(ch, '。' | '！' | '？' | '…' | '.' | '!' | '?')
}

/// 自然停顿标点
#[inline]
pub fn is_pause_mark(ch: char) -> bool {
    matches!(ch, '，' | '、' | '；' | '：' | '—' | ',' | ';' | ':')
}

/// 开引号 / 开括号
///
/// ASCII `"` 不在此列，它由 [`is_ambiguous_quote`] 单独处理
#[inline]
pub fn is_opening_quote(ch: char) -> bool {
    matches!(
        ch,
        '“' | '‘' | '「' | '『' | '（' | '(' | '【' | '[' | '《' | '〈' | '{'
    )
}

/// 闭引号 / 闭括号（含 ASCII `"` 与 `'`）
#[inline]
pub fn is_closing_quote(ch: char) -> bool {
    matches!(
        ch,
        '”' | '’' | '」' | '』' | '）' | ')' | '】' | ']' | '》' | '〉' | '}' | '"' | '\''
    )
}

/// 开闭同形的引号
#[inline]
pub fn is_ambiguous_quote(ch: char) -> bool {
    ch == '"'
}

/// 闭引号对应的开引号
pub fn matching_opener(close: char) -> Option<char> {
    let open = match close {
        '”' => '“',
        '’' => '‘',
        '」' => '「',
        '』' => '『',
        '）' => '（',
        ')' => '(',
        '】' => '【',
        ']' => '[',
        '》' => '《',
        '〉' => '〈',
        '}' => '{',
        '"' => '"',
        _ => return None,
    };
    Some(open)
}

/// 去重并保持顺序
pub fn dedup_delimiters(chars: impl IntoIterator<Item = char>) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();
    for ch in chars {
        if !ch.is_whitespace() && !out.contains(&ch) {
            out.push(ch);
        }
    }
    out
}

/// 引号栈（尽力配对，不要求严格平衡）
#[derive(Debug, Default, Clone)]
pub struct QuoteStack {
    stack: Vec<char>,
}

impl QuoteStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// 处理一个字符，返回该字符是否关闭了最外层引号
    pub fn feed(&mut self, ch: char) -> bool {
        if is_ambiguous_quote(ch) {
            if self.stack.last() == Some(&'"') {
                self.stack.pop();
                return self.stack.is_empty();
            }
            self.stack.push(ch);
            return false;
        }
        if is_opening_quote(ch) {
            self.stack.push(ch);
            return false;
        }
        if let Some(open) = matching_opener(ch) {
            // 从栈顶向下找最近的匹配开引号，中间未闭合的一并丢弃
            if let Some(pos) = self.stack.iter().rposition(|&c| c == open) {
                self.stack.truncate(pos);
                return self.stack.is_empty();
            }
        }
        false
    }

    /// 从一段文本重建栈
    pub fn rebuild(&mut self, chars: &[char]) {
        self.stack.clear();
        for &ch in chars {
            self.feed(ch);
        }
    }
}
