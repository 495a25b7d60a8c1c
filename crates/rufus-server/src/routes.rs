//! HTTP handlers and the error-to-status mapping.
//!
//! Handlers translate core failures into an HTTP status plus a fixed
//! user-safe detail string; the internal error text only ever reaches the
//! server log.

use crate::schema::{ChatPayload, ChatResponse, MessageResponse, StartSessionPayload, TextRecommendQuery};
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rufus_application::{AgentService, RecommendationReply, StartedSession};
use rufus_core::RufusError;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AgentService>,
}

/// An HTTP status with a user-safe detail message.
pub struct ApiError {
    status: StatusCode,
    detail: &'static str,
}

impl ApiError {
    fn new(status: StatusCode, detail: &'static str) -> Self {
        Self { status, detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the E-Commerce Service API with Rufus!",
    })
}

pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionPayload>,
) -> Result<Json<StartedSession>, ApiError> {
    state
        .service
        .start_session(payload.user_info)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!("Failed to start session: {err}");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error starting chat session. Please contact support.",
            )
        })
}

pub async fn chat_with_agent(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatResponse>, ApiError> {
    match state.service.chat(&payload.session_id, &payload.message).await {
        Ok(message) => Ok(Json(ChatResponse { message })),
        Err(err) if err.is_session_not_found() => {
            tracing::warn!("Chat session not found: {}", payload.session_id);
            Err(ApiError::new(
                StatusCode::NOT_FOUND,
                "Session not found. Please start a new session.",
            ))
        }
        Err(err) => {
            tracing::error!("Chat failed for session {}: {err}", payload.session_id);
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing chat message. Please try again.",
            ))
        }
    }
}

pub async fn recommend_text(
    State(state): State<AppState>,
    Json(payload): Json<TextRecommendQuery>,
) -> Result<Json<RecommendationReply>, ApiError> {
    state
        .service
        .recommend_text(&payload.query)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::error!("Text recommendation failed: {err}");
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing text recommendation. Please check server logs.",
            )
        })
}

pub async fn recommend_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RecommendationReply>, ApiError> {
    let mut file_bytes = None;
    let mut mime_type = String::from("application/octet-stream");

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("file") {
            if let Some(content_type) = field.content_type() {
                mime_type = content_type.to_string();
            }
            file_bytes = Some(field.bytes().await.map_err(bad_multipart)?);
            break;
        }
    }

    // A request without a file field behaves like an empty upload.
    let bytes = file_bytes.unwrap_or_default();

    match state.service.recommend_image(&bytes, &mime_type).await {
        Ok(reply) => Ok(Json(reply)),
        Err(RufusError::EmptyUpload) => {
            tracing::warn!("Rejected empty image upload");
            Err(ApiError::new(StatusCode::BAD_REQUEST, "Uploaded file is empty."))
        }
        Err(err) if err.is_upstream_auth() => {
            tracing::error!("Gemini API permission or key error during image recommendation: {err}");
            Err(ApiError::new(
                StatusCode::FORBIDDEN,
                "Rufus: There seems to be an issue with API access for image processing.",
            ))
        }
        Err(err) => {
            tracing::error!("Image recommendation failed: {err}");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Rufus: Sorry, I encountered an error processing the image recommendation.",
            ))
        }
    }
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::warn!("Malformed multipart upload: {err}");
    ApiError::new(StatusCode::BAD_REQUEST, "Invalid multipart upload.")
}
