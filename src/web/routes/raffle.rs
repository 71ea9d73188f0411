use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::database::event_repo;
use crate::services::raffle;
use crate::services::registration::{ROLE_ORGANIZER, ROLE_PARTICIPANT};
use crate::web::middleware::auth::AuthenticatedProfile;
use crate::web::routes::engine_error_response;
use crate::web::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct RaffleQuery {
    pub role: Option<String>,
    pub limit: Option<i64>,
}

fn validate(query: &RaffleQuery) -> Result<(Option<&str>, Option<usize>), &'static str> {
    let role = match query.role.as_deref() {
        None | Some("") => None,
        Some(role) if role == ROLE_PARTICIPANT || role == ROLE_ORGANIZER => Some(role),
        Some(_) => return Err("role must be Participant or Organizer"),
    };
    let limit = match query.limit {
        None => None,
        Some(limit) if limit > 0 => Some(limit as usize),
        Some(_) => return Err("limit must be a positive number"),
    };
    Ok((role, limit))
}

/// Shuffled eligible pool for the raffle screen.
pub async fn pool_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    Query(query): Query<RaffleQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (role, limit) = match validate(&query) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("raffle", e.into()),
    };

    match raffle::shuffled_pool(&state.pool, event.id, role, limit).await {
        Ok(entries) => Json(json!({
            "count": entries.len(),
            "requested_limit": limit,
            "requested_role": role,
            "data": entries,
        }))
        .into_response(),
        Err(e) => engine_error_response("raffle", e),
    }
}

/// One independent draw. An empty pool blocks the draw instead of crashing.
pub async fn winner_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    Query(query): Query<RaffleQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (role, _) = match validate(&query) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
    };
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("raffle winner", e.into()),
    };

    let entries = match raffle::shuffled_pool(&state.pool, event.id, role, None).await {
        Ok(entries) => entries,
        Err(e) => return engine_error_response("raffle winner", e),
    };
    match raffle::draw(entries.len()) {
        Some(index) => Json(json!({ "winner": entries[index], "pool_size": entries.len() }))
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no eligible registrations to draw from" })),
        )
            .into_response(),
    }
}
