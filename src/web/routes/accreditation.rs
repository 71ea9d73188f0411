use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::database::{event_repo, registration_repo};
use crate::web::middleware::auth::AuthenticatedProfile;
use crate::web::routes::engine_error_response;
use crate::web::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct AccreditationQuery {
    pub role: Option<String>,
    pub package: Option<String>,
}

/// Accreditation table: one row per registration with a boolean per
/// catalogue activity, optionally narrowed by role or chosen package.
pub async fn list_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    Query(query): Query<AccreditationQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("accreditations", e.into()),
    };

    let mut listing = match state.ledger.list_completions(&state.pool, event.id).await {
        Ok(listing) => listing,
        Err(e) => return engine_error_response("accreditations", e),
    };

    if let Some(role) = query.role.as_deref() {
        listing.rows.retain(|row| row.role == role);
    }
    if let Some(package) = query.package.as_deref() {
        listing
            .rows
            .retain(|row| row.responses.get("package").map(String::as_str) == Some(package));
    }

    Json(listing).into_response()
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    pub registration_id: String,
    pub activity: String,
    pub value: bool,
}

/// Manual toggle from the accreditation table. The upsert is idempotent, so
/// an optimistic UI can retry this blindly and reconcile with the response.
pub async fn update_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    State(state): State<AppState>,
    Json(body): Json<UpdateBody>,
) -> impl IntoResponse {
    let registration =
        match registration_repo::load_registration(&state.pool, &body.registration_id).await {
            Ok(Some(registration)) => registration,
            Ok(None) => return StatusCode::NOT_FOUND.into_response(),
            Err(e) => return engine_error_response("accreditation update", e.into()),
        };

    let written = state
        .ledger
        .set_completion(&state.pool, &registration, &body.activity, body.value)
        .await;

    match written {
        Ok(()) => Json(json!({
            "registration_id": body.registration_id,
            "activity": body.activity,
            "value": body.value,
        }))
        .into_response(),
        Err(e) => engine_error_response("accreditation update", e),
    }
}
