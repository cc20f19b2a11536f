//! Session lifecycle handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use vchat_models::{ConversationTurn, SessionId};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

/// Open a new chat session.
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let (id, created_at) = state.sessions.create().await?;
    metrics::set_active_sessions(state.sessions.len().await);
    info!(session_id = %id, "Session opened");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: id.to_string(),
            created_at,
        }),
    ))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

/// Session history as JSON. Waits for an in-flight interaction to finish.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let id = SessionId::from_string(session_id);
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Session {} not found", id)))?;

    let session = handle.lock().await;
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        created_at: session.created_at(),
        last_active_at: session.last_active_at(),
        turns: session.history().turns().to_vec(),
    }))
}

/// End a session and drop its history.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = SessionId::from_string(session_id);
    if !state.sessions.remove(&id).await {
        return Err(ApiError::not_found(format!("Session {} not found", id)));
    }
    metrics::set_active_sessions(state.sessions.len().await);

    Ok(StatusCode::NO_CONTENT)
}
