//! Worker Layer - Background Job Processing
//!
//! 实现 SynthesisWorker，按顺序合成一个任务中的所有片段

mod synthesis_worker;

pub use synthesis_worker::{SynthesisWorker, SynthesisWorkerConfig};
