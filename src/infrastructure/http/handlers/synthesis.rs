//! Synthesis Handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    GetSegmentAudio, GetSynthesisJob, SubmitSynthesisCommand, SubmitSynthesisResponse,
    SynthesisJobResponse,
};
use crate::domain::performance::SessionId;
use crate::infrastructure::http::dto::{ApiResponse, SubmitSynthesisRequest, SynthesisStatusRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn submit_synthesis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitSynthesisRequest>,
) -> Result<Json<ApiResponse<SubmitSynthesisResponse>>, ApiError> {
    let cmd = SubmitSynthesisCommand {
        session_id: req.session_id,
        emotion_weight: req.emotion_weight,
        emotion_audio: req.emotion_audio,
        emotion_text: req.emotion_text,
    };

    let result = state.submit_synthesis_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn synthesis_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SynthesisStatusRequest>,
) -> Result<Json<ApiResponse<SynthesisJobResponse>>, ApiError> {
    let job = state
        .get_job_handler
        .handle(GetSynthesisJob { job_id: req.job_id })?;
    Ok(Json(ApiResponse::success(job)))
}

/// 流式返回片段音频
pub async fn segment_audio(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(SessionId, usize)>,
) -> Result<Response, ApiError> {
    let path = state
        .get_audio_handler
        .handle(GetSegmentAudio { session_id, index })
        .await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, file_size)
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
