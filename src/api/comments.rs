use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::db::{Comment, CommentedSession, CreateCommentRequest};
use crate::schedule::{comments, schedule_days, Actor};
use crate::AppState;

use super::error::ApiError;
use super::sessions::ScheduleResponse;
use super::validation::validate_attachment_path;

/// Finished sessions in the caller's scope with their comments, by day
pub async fn list_commented_sessions(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<ScheduleResponse<CommentedSession>>, ApiError> {
    let sessions = comments::list_commented_sessions(&state.db, &actor, Utc::now()).await?;

    let tz = state.policy.timezone;
    Ok(Json(ScheduleResponse {
        timezone: tz.name().to_string(),
        days: schedule_days(sessions, tz),
    }))
}

/// Comment on a session you taught, once it is over
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(session_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    validate_attachment_path(&req.attachment_path)
        .map_err(|message| ApiError::validation_field("attachment_path", message))?;

    let comment = comments::add_comment(
        &state.db,
        &actor,
        session_id,
        &req.comment,
        req.attachment_path.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
