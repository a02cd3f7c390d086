//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `ROLECAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `ROLECAST_SERVER__PORT=8080`
/// - `ROLECAST_TTS__URL=http://tts-server:7860`
/// - `ROLECAST_LLM__API_KEY=sk-...`
/// - `ROLECAST_SEGMENTATION__MODE=punctuation`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级），其余字段由 serde default 补齐
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("tts.url", "http://127.0.0.1:7860")?
        .set_default("tts.timeout_secs", 120)?
        .set_default("llm.base_url", "https://api.openai.com/v1")?
        .set_default("llm.model", "gpt-4o-mini")?
        .set_default("segmentation.mode", "intelligent")?
        .set_default("storage.audio_dir", "data/audio")?
        .set_default("storage.voices_dir", "data/voices")?
        .set_default("storage.state_db", "data/state.sled")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    builder = builder.add_source(
        Environment::with_prefix("ROLECAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.tts.emotion_weight) {
        return Err(ConfigError::ValidationError(format!(
            "Emotion weight must be within [0, 1], got {}",
            config.tts.emotion_weight
        )));
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError(
            "LLM max_tokens cannot be 0".to_string(),
        ));
    }

    let seg = &config.segmentation;
    if seg.chars_per_line == 0 {
        return Err(ConfigError::ValidationError(
            "chars_per_line cannot be 0".to_string(),
        ));
    }
    if seg.ai_min_len == 0 || seg.ai_min_len > seg.ai_max_len {
        return Err(ConfigError::ValidationError(format!(
            "Invalid AI segment length range: {}..{}",
            seg.ai_min_len, seg.ai_max_len
        )));
    }

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let head: String = secret.chars().take(3).collect();
    format!("{}***", head)
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("Emotion Weight: {}", config.tts.emotion_weight);
    tracing::info!("LLM: {} ({})", config.llm.base_url, config.llm.model);
    tracing::info!("LLM API Key: {}", mask_secret(&config.llm.api_key));
    tracing::info!(
        "Segmentation: mode={}, chars_per_line={}, quote_glue={}",
        config.segmentation.mode.as_str(),
        config.segmentation.chars_per_line,
        config.segmentation.quote_glue
    );
    tracing::info!("Audio Directory: {:?}", config.storage.audio_dir);
    tracing::info!("Voices Directory: {:?}", config.storage.voices_dir);
    tracing::info!("State DB: {:?}", config.storage.state_db);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_ai_lengths() {
        let mut config = AppConfig::default();
        config.segmentation.ai_min_len = 30;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_chars_per_line() {
        let mut config = AppConfig::default();
        config.segmentation.chars_per_line = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "<unset>");
        assert_eq!(mask_secret("sk-abcdef"), "sk-***");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolecast.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[segmentation]\nmode = \"punctuation\"\nchars_per_line = 20\n\n[llm]\nmodel = \"qwen-plus\""
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.segmentation.mode,
            crate::domain::script::SplitMode::Punctuation
        );
        assert_eq!(config.segmentation.chars_per_line, 20);
        assert_eq!(config.llm.model, "qwen-plus");
        assert_eq!(config.llm.max_tokens, 2000);
    }
}
