//! Voice Handlers

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::path::Path;
use std::sync::Arc;

use crate::application::{ListVoices, VoiceResponse};
use crate::domain::voice::{AudioFormat, VoiceRef};
use crate::infrastructure::http::dto::{ApiResponse, VoiceAudioRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<VoiceResponse>>>, ApiError> {
    let voices = state.list_voices_handler.handle(ListVoices).await?;
    Ok(Json(ApiResponse::success(voices)))
}

/// 返回音色参考音频，供试听
pub async fn voice_audio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VoiceAudioRequest>,
) -> Result<Response, ApiError> {
    let voice = VoiceRef::new(req.voice_ref).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let data = state
        .voice_library
        .read_audio(&voice)
        .await
        .map_err(crate::application::ApplicationError::from)?;

    let content_type = AudioFormat::from_path(Path::new(voice.as_str()))
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
