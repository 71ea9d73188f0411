use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::services::scan::{self, ScanOutcome};
use crate::web::middleware::auth::AuthenticatedProfile;
use crate::web::routes::engine_error_response;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub token: String,
    pub activity: String,
}

/// Step one of a scan: resolve the decoded token and report what the
/// operator should see. Never mutates the ledger.
pub async fn resolve_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Query(query): Query<ResolveQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let outcome = scan::resolve(
        &state.pool,
        state.ledger.as_ref(),
        state.cooldown.as_ref(),
        &query.token,
        &query.activity,
    )
    .await;

    match outcome {
        Ok(ScanOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, Json(json!({ "state": "not_found" }))).into_response()
        }
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => engine_error_response("scan resolve", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub registration_id: String,
    pub activity: String,
}

/// Step two, after the operator's explicit yes.
pub async fn confirm_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    State(state): State<AppState>,
    Json(body): Json<ConfirmBody>,
) -> impl IntoResponse {
    let completed = scan::confirm(
        &state.pool,
        state.ledger.as_ref(),
        &body.registration_id,
        &body.activity,
    )
    .await;

    match completed {
        Ok(registrant) => Json(json!({
            "state": "completed",
            "registrant": registrant,
        }))
        .into_response(),
        Err(e) => engine_error_response("scan confirm", e),
    }
}
