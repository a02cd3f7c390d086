//! 共享文本工具：CJK 加权计数、标点分类

mod char_counter;
mod punctuation;

pub use char_counter::{
    char_weight, han_count, is_cjk, length_warning, weighted_length, LengthWarning,
};
pub use punctuation::{
    dedup_delimiters, is_ambiguous_quote, is_closing_quote, is_opening_quote, is_pause_mark,
    is_sentence_terminator, matching_opener, QuoteStack, DEFAULT_DELIMITERS,
};
