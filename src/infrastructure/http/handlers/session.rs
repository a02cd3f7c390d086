//! Session Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    AnnotateSessionCommand, AnnotationAccepted, CloseSessionCommand, CloseSessionResponse,
    CreateSessionCommand, CreateSessionResponse, EditSessionCommand, EditSessionResponse,
    GetPerformancePlan, GetSession, ResegmentCommand, SaveSessionCommand, SaveSessionResponse,
    SessionView,
};
use crate::domain::performance::PerformanceItem;
use crate::infrastructure::http::dto::{
    ApiResponse, CreateSessionRequest, EditSessionRequest, ResegmentRequest, SessionIdRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Create / Get
// ============================================================================

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<CreateSessionResponse>>, ApiError> {
    let cmd = CreateSessionCommand {
        text: req.text,
        mode: req.mode,
        restore_from: req.restore_from,
    };

    let result = state.create_session_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let view = state
        .get_session_handler
        .handle(GetSession {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(view)))
}

// ============================================================================
// Resegment / Edit
// ============================================================================

pub async fn resegment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResegmentRequest>,
) -> Result<Json<ApiResponse<EditSessionResponse>>, ApiError> {
    let cmd = ResegmentCommand {
        session_id: req.session_id,
        text: req.text,
        mode: req.mode,
    };

    let result = state.resegment_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn edit_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EditSessionRequest>,
) -> Result<Json<ApiResponse<EditSessionResponse>>, ApiError> {
    let cmd = EditSessionCommand {
        session_id: req.session_id,
        edit: req.edit,
        expected_version: req.expected_version,
    };

    let result = state.edit_session_handler.handle(cmd).await?;
    Ok(Json(ApiResponse::success(result)))
}

// ============================================================================
// Annotate / Plan
// ============================================================================

/// 受理后立即返回；进度与结果通过 /ws/session/{id} 推送
pub async fn annotate_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<AnnotationAccepted>>, ApiError> {
    let accepted = state.annotate_handler.accept(AnnotateSessionCommand {
        session_id: req.session_id,
    })?;
    Ok(Json(ApiResponse::success(accepted)))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<Vec<PerformanceItem>>>, ApiError> {
    let plan = state
        .get_plan_handler
        .handle(GetPerformancePlan {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(plan)))
}

// ============================================================================
// Save / Close
// ============================================================================

pub async fn save_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<SaveSessionResponse>>, ApiError> {
    let result = state
        .save_session_handler
        .handle(SaveSessionCommand {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionIdRequest>,
) -> Result<Json<ApiResponse<CloseSessionResponse>>, ApiError> {
    let result = state
        .close_session_handler
        .handle(CloseSessionCommand {
            session_id: req.session_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
