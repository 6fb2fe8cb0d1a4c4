use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::Catalog;
use crate::schedule::Actor;
use crate::AppState;

use super::error::ApiError;

/// Reference lists for the booking and filter widgets, each ordered by name
pub async fn get_catalog(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
) -> Result<Json<Catalog>, ApiError> {
    let catalog = Catalog::load(&state.db).await?;
    Ok(Json(catalog))
}
