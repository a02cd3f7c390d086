//! Rolecast - 剧本分段与演绎标注引擎
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Text: CJK 加权计数与标点分类
//! - Script: 分段器、引号粘合、长度预算器
//! - Performance: 分段会话、角色/情感/语速注解
//! - Voice: 音色库与音色推荐
//! - Annotation: AI 标注的提示词、解析与合并
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SessionManager, JobManager, StateStore, VoiceLibrary, ChatCompletion, TtsEngine）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//! - AiAnnotator: 分批调用对话模型并合并结果
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager, JobManager 内存实现
//! - Worker: SynthesisWorker 后台合成
//! - Persistence: Sled 角色表与行注解
//! - Adapters: TTS Client, Chat Client, 文件系统音色库
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
