//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::{AnnotatorSettings, SessionDefaults};
use crate::domain::annotation::ReconcileOptions;
use crate::domain::script::{SegmenterConfig, SplitMode, DEFAULT_CHARS_PER_LINE};
use crate::domain::text::DEFAULT_DELIMITERS;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 对话模型配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 分段配置
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,

    /// 默认情感权重 [0, 1]
    #[serde(default = "default_emotion_weight")]
    pub emotion_weight: f32,
}

fn default_tts_url() -> String {
    "http://127.0.0.1:7860".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_emotion_weight() -> f32 {
    0.65
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_timeout(),
            max_retries: 0,
            emotion_weight: default_emotion_weight(),
        }
    }
}

/// 对话模型配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// 原样透传
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 透传给模型，同时决定分批预算
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

/// 分段配置
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// none / punctuation / intelligent
    #[serde(default)]
    pub mode: SplitMode,

    /// 标点模式的分隔符，按出现顺序去重
    #[serde(default = "default_delimiters")]
    pub delimiters: String,

    #[serde(default = "default_true")]
    pub quote_glue: bool,

    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,

    /// AI 片段目标长度（汉字单位）
    #[serde(default = "default_ai_min_len")]
    pub ai_min_len: usize,

    #[serde(default = "default_ai_max_len")]
    pub ai_max_len: usize,

    /// 采用 AI 给出的情感
    #[serde(default = "default_true")]
    pub ai_adjust_emotion: bool,

    /// 采用 AI 给出的语速
    #[serde(default)]
    pub ai_adjust_speed: bool,
}

fn default_delimiters() -> String {
    DEFAULT_DELIMITERS.iter().collect()
}

fn default_true() -> bool {
    true
}

fn default_chars_per_line() -> usize {
    DEFAULT_CHARS_PER_LINE
}

fn default_ai_min_len() -> usize {
    5
}

fn default_ai_max_len() -> usize {
    25
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            mode: SplitMode::default(),
            delimiters: default_delimiters(),
            quote_glue: true,
            chars_per_line: default_chars_per_line(),
            ai_min_len: default_ai_min_len(),
            ai_max_len: default_ai_max_len(),
            ai_adjust_emotion: true,
            ai_adjust_speed: false,
        }
    }
}

impl SegmentationConfig {
    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig::new(self.delimiters.chars(), self.quote_glue, self.chars_per_line)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            min_len: self.ai_min_len,
            max_len: self.ai_max_len,
            adjust_emotion: self.ai_adjust_emotion,
            adjust_speed: self.ai_adjust_speed,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 合成音频输出目录
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// 音色参考音频目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// 角色表与行注解数据库
    #[serde(default = "default_state_db")]
    pub state_db: PathBuf,

    /// 恢复会话时是否恢复行情感（默认每次重新开始）
    #[serde(default)]
    pub restore_line_emotions: bool,
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/audio")
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("data/voices")
}

fn default_state_db() -> PathBuf {
    PathBuf::from("data/state.sled")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
            voices_dir: default_voices_dir(),
            state_db: default_state_db(),
            restore_line_emotions: false,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn session_defaults(&self) -> SessionDefaults {
        SessionDefaults {
            mode: self.segmentation.mode,
            config: self.segmentation.segmenter_config(),
            restore_line_emotions: self.storage.restore_line_emotions,
        }
    }

    pub fn annotator_settings(&self) -> AnnotatorSettings {
        AnnotatorSettings {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            reconcile: self.segmentation.reconcile_options(),
        }
    }
}
