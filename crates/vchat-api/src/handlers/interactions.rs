//! Video interaction handler.
//!
//! The interaction runs in its own task so that a client disconnect only
//! cancels the poll and pending generation calls. Remote asset deletion and
//! scratch-file cleanup always run to completion inside the task.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use vchat_models::SessionId;
use vchat_session::{InteractionRequest, StagingWriter};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::render::{render_interaction, MARKDOWN_CONTENT_TYPE};
use crate::state::AppState;

/// Multipart field carrying the video file.
const VIDEO_FIELD: &str = "video";
/// Multipart field carrying the optional question.
const PROMPT_FIELD: &str = "prompt";

/// Upload a video, ask about it, and return the rendered markdown.
pub async fn create_interaction(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let id = SessionId::from_string(session_id);
    let session = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Session {} not found", id)))?;

    let request = read_interaction_form(&mut multipart, &state.pipeline.config().scratch_dir)
        .await
        .inspect_err(|e| metrics::record_interaction_failed(e.code()))?;

    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let pipeline = Arc::clone(&state.pipeline);

    let task = tokio::spawn(async move {
        let mut session = session.lock_owned().await;
        session.touch();
        let result = pipeline.run(&mut session, request, &cancel).await;
        session.touch();
        (result, session.history().clone())
    });

    let (result, history) = task
        .await
        .map_err(|e| ApiError::internal(format!("Interaction task failed: {}", e)))?;

    match result {
        Ok(report) => {
            metrics::record_interaction(&report);
            let body = render_interaction(&report, &history);
            Ok(([(header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE)], body).into_response())
        }
        Err(e) => {
            let err = ApiError::from(e);
            metrics::record_interaction_failed(err.code());
            Err(err)
        }
    }
}

/// Read the `video` file and optional `prompt` fields. Unknown fields are ignored.
///
/// The video is streamed into a scratch file as it arrives.
async fn read_interaction_form(
    multipart: &mut Multipart,
    scratch_dir: &FsPath,
) -> ApiResult<InteractionRequest> {
    let mut video = None;
    let mut prompt = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(VIDEO_FIELD) => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("'video' field must be a file upload"))?;

                let mut writer = StagingWriter::create(scratch_dir, filename).await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    writer.write_chunk(&chunk).await?;
                }
                video = Some(writer.finish().await?);
            }
            Some(PROMPT_FIELD) => {
                prompt = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                warn!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    let video = video.ok_or_else(|| ApiError::bad_request("Missing 'video' file field"))?;
    let request = InteractionRequest::staged(video);
    Ok(match prompt {
        Some(prompt) => request.with_prompt(prompt),
        None => request,
    })
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}
