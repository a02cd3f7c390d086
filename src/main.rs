//! Rolecast - 剧本分段与演绎标注服务
//!
//! 组装顺序：配置 → 日志 → 存储 → 外部服务客户端 → 后台 Worker → HTTP

use std::sync::Arc;

use rolecast::application::AiAnnotator;
use rolecast::config::{load_config, print_config, AppConfig};
use rolecast::infrastructure::adapters::{
    FsVoiceLibrary, HttpTtsClient, HttpTtsClientConfig, OpenAiChatClient, OpenAiChatClientConfig,
};
use rolecast::infrastructure::events::EventPublisher;
use rolecast::infrastructure::http::{AppDeps, AppState, HttpServer};
use rolecast::infrastructure::memory::{InMemoryJobManager, InMemorySessionManager};
use rolecast::infrastructure::persistence::SledStateStore;
use rolecast::infrastructure::worker::{SynthesisWorker, SynthesisWorkerConfig};
use tokio::sync::mpsc;

/// 合成队列容量
const JOB_QUEUE_CAPACITY: usize = 256;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},rolecast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Rolecast - 剧本分段与演绎标注服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.audio_dir).await?;
    tokio::fs::create_dir_all(&config.storage.voices_dir).await?;
    if let Some(parent) = config.storage.state_db.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 持久化与音色库
    let state_store = Arc::new(SledStateStore::open(&config.storage.state_db)?);
    let voice_library = Arc::new(FsVoiceLibrary::new(&config.storage.voices_dir));

    // 外部服务客户端
    let chat_client = Arc::new(OpenAiChatClient::new(OpenAiChatClientConfig {
        base_url: config.llm.base_url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout_secs: config.llm.timeout_secs,
    })?);
    let tts_engine = Arc::new(HttpTtsClient::new(HttpTtsClientConfig {
        base_url: config.tts.url.clone(),
        timeout_secs: config.tts.timeout_secs,
        max_retries: config.tts.max_retries,
    })?);

    // 事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    let annotator = Arc::new(AiAnnotator::new(
        chat_client,
        event_publisher.clone(),
        config.annotator_settings(),
    ));

    // 合成队列
    let (job_tx, job_rx) = mpsc::channel(JOB_QUEUE_CAPACITY);

    let session_manager = Arc::new(InMemorySessionManager::new());
    let job_manager = Arc::new(InMemoryJobManager::new(job_tx));

    let worker = SynthesisWorker::new(
        SynthesisWorkerConfig {
            max_concurrent: 2,
            audio_dir: config.storage.audio_dir.clone(),
        },
        job_rx,
        job_manager.clone(),
        session_manager.clone(),
        tts_engine,
        event_publisher.clone(),
    );
    tokio::spawn(worker.run());

    let state = AppState::new(AppDeps {
        session_manager,
        job_manager,
        state_store,
        voice_library,
        annotator,
        event_publisher,
        session_defaults: config.session_defaults(),
        emotion_weight: config.tts.emotion_weight,
        audio_dir: config.storage.audio_dir.clone(),
    });

    let server = HttpServer::new(&config.server, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
