//! Annotation Context - AI 标注
//!
//! 与外部对话模型交互时的纯逻辑部分（不含网络调用）：
//! - 提示词与分批规划
//! - 容错解析与启发式兜底
//! - 批次校对与跨批次合并

mod analysis;
mod heuristic;
mod parser;
mod prompt;
mod reconcile;

pub use analysis::{
    AnalysisResult, AnalysisRole, AnalyzedSegment, LineAnnotation, RawAnalysis, RawAssignment,
    RawRole, RawSegment, SegmentKind,
};
pub use heuristic::{heuristic_analysis, HeuristicAnalysis};
pub use parser::{
    interpret_response, parse_response, ParseFailure, ParseStrategy, ParsedAnalysis,
    StrategyAttempt,
};
pub use prompt::{
    batch_budget, build_prompt, needs_chunking, plan_batches, PromptContext, SYSTEM_PROMPT,
};
pub use reconcile::{reconcile_batch, AnalysisAccumulator, BatchOutcome, BatchSource, ReconcileOptions};
