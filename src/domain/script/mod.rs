//! Script Context - 文本分段
//!
//! 负责把原始文本切成适合逐句合成的片段：
//! - 分段器（none / punctuation / intelligent）
//! - 引号粘合
//! - 长度预算器

mod budgeter;
mod quote_glue;
mod segmenter;
mod value_objects;

pub use budgeter::rebudget;
pub use quote_glue::{glue, glue_texts};
pub use segmenter::segment;
pub use value_objects::{
    Segment, SegmenterConfig, SplitMode, SplitThresholds, DEFAULT_CHARS_PER_LINE,
};
