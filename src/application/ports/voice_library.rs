//! Voice Library Port - 音色库

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{VoiceLibrary, VoiceRef};

#[derive(Debug, Error)]
pub enum VoiceLibraryError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Voice not found: {0}")]
    NotFound(String),
}

/// Voice Library Port
#[async_trait]
pub trait VoiceLibraryPort: Send + Sync {
    /// 扫描当前可用的音色
    async fn load(&self) -> Result<VoiceLibrary, VoiceLibraryError>;

    /// 读取音色参考音频
    async fn read_audio(&self, voice: &VoiceRef) -> Result<Vec<u8>, VoiceLibraryError>;
}
