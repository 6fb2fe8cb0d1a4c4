use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{ChangeRequest, CreateChangeRequest, DecideChangeRequest};
use crate::schedule::{change_requests, Actor};
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    /// Admins only: also show requests that were turned down
    #[serde(default)]
    pub include_rejected: bool,
}

/// List change requests: all but rejected ones for admins, your own otherwise
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<ChangeRequest>>, ApiError> {
    let requests =
        change_requests::list_requests(&state.db, &actor, query.include_rejected).await?;
    Ok(Json(requests))
}

/// Ask for a change to a session
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(req): Json<CreateChangeRequest>,
) -> Result<(StatusCode, Json<ChangeRequest>), ApiError> {
    let request =
        change_requests::create_request(&state.db, &actor, req.schedule_id, &req.desired_change)
            .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Approve or reject a pending request
pub async fn decide_request(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(req): Json<DecideChangeRequest>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let request = change_requests::decide_request(&state.db, &actor, id, req.decision).await?;
    Ok(Json(request))
}
