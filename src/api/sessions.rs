use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{Session, SessionView};
use crate::schedule::{
    repository, schedule_days, Actor, BookingForm, BookingOutcome, ScheduleDay, ScheduleError,
    SessionFilter,
};
use crate::AppState;

use super::auth::require_admin;
use super::error::ApiError;
use super::validation::{field_error, validate_filter_id, validate_temporal};

/// Query string of the schedule listing; empty values mean "any"
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    pub group: Option<String>,
    pub teacher: Option<String>,
    pub classroom: Option<String>,
    pub subject: Option<String>,
    pub when: Option<String>,
}

impl ListSessionsQuery {
    fn into_filter(self, actor: &Actor) -> Result<SessionFilter, ApiError> {
        Ok(SessionFilter {
            group_id: field_error("group", validate_filter_id(self.group.as_deref(), "Group"))?,
            teacher_id: field_error(
                "teacher",
                validate_filter_id(self.teacher.as_deref(), "Teacher"),
            )?,
            classroom_id: field_error(
                "classroom",
                validate_filter_id(self.classroom.as_deref(), "Classroom"),
            )?,
            subject_id: field_error(
                "subject",
                validate_filter_id(self.subject.as_deref(), "Subject"),
            )?,
            scope: actor.scope(),
            temporal: validate_temporal(self.when.as_deref())
                .map_err(|message| ApiError::validation_field("when", message))?,
        })
    }
}

/// Day-grouped schedule in the configured zone
#[derive(Debug, Serialize)]
pub struct ScheduleResponse<T> {
    pub timezone: String,
    pub days: Vec<ScheduleDay<T>>,
}

/// List sessions visible to the caller, grouped by calendar day
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<ScheduleResponse<SessionView>>, ApiError> {
    let filter = query.into_filter(&actor)?;

    let mut conn = state.db.acquire().await?;
    let sessions = repository::list_sessions(&mut conn, &filter, Utc::now()).await?;

    let tz = state.policy.timezone;
    Ok(Json(ScheduleResponse {
        timezone: tz.name().to_string(),
        days: schedule_days(sessions, tz),
    }))
}

/// Get a session in its editable form, group ids included
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<Json<Session>, ApiError> {
    require_admin(&actor)?;

    let mut conn = state.db.acquire().await?;
    let session = repository::get_session(&mut conn, id).await?;
    Ok(Json(session))
}

/// Book a new session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<BookingOutcome>), ApiError> {
    require_admin(&actor)?;
    outcome_response(state.booking.create(&form).await, StatusCode::CREATED)
}

/// Re-book an existing session; its own slot never counts as a collision
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<BookingOutcome>), ApiError> {
    require_admin(&actor)?;
    outcome_response(state.booking.update(id, &form).await, StatusCode::OK)
}

/// Delete a session along with its group links, requests and comments
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&actor)?;
    state.booking.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Domain rejections travel as a `BookingOutcome`; store failures use the error envelope
fn outcome_response(
    result: Result<i64, ScheduleError>,
    success: StatusCode,
) -> Result<(StatusCode, Json<BookingOutcome>), ApiError> {
    match result {
        Ok(id) => Ok((success, Json(BookingOutcome::booked(id)))),
        Err(ScheduleError::Store(e)) => Err(ApiError::from(e)),
        Err(e) => {
            let outcome = BookingOutcome::rejected(&e);
            let status = ApiError::from(e).status();
            Ok((status, Json(outcome)))
        }
    }
}
