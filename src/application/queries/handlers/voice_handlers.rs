//! Voice Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VoiceLibraryPort;
use crate::application::queries::ListVoices;
use crate::domain::voice::VoiceEntry;

/// 音色响应
#[derive(Debug, Clone, Serialize)]
pub struct VoiceResponse {
    pub voice_ref: String,
    pub name: String,
    pub format: String,
}

impl From<&VoiceEntry> for VoiceResponse {
    fn from(entry: &VoiceEntry) -> Self {
        Self {
            voice_ref: entry.voice_ref().to_string(),
            name: entry.name().to_string(),
            format: entry.format().extension().to_string(),
        }
    }
}

/// ListVoices Handler
pub struct ListVoicesHandler {
    voice_library: Arc<dyn VoiceLibraryPort>,
}

impl ListVoicesHandler {
    pub fn new(voice_library: Arc<dyn VoiceLibraryPort>) -> Self {
        Self { voice_library }
    }

    pub async fn handle(&self, _query: ListVoices) -> Result<Vec<VoiceResponse>, ApplicationError> {
        let library = self.voice_library.load().await?;
        Ok(library.voices().iter().map(VoiceResponse::from).collect())
    }
}
