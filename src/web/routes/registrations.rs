use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::database::{event_repo, profile_repo, registration_repo};
use crate::services::registration::{self, ROLE_PARTICIPANT};
use crate::web::middleware::auth::AuthenticatedProfile;
use crate::web::routes::engine_error_response;
use crate::web::AppState;

pub async fn register_handler(
    Extension(auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    State(state): State<AppState>,
    Json(values): Json<HashMap<String, String>>,
) -> impl IntoResponse {
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("register", e.into()),
    };

    let submitted = registration::submit(
        &state.pool,
        &event,
        &auth.id,
        auth.email.as_deref(),
        ROLE_PARTICIPANT,
        &values,
    )
    .await;

    match submitted {
        Ok(created) => {
            notify_profile(&state, &auth.id, &event.name, NotifyKind::Received).await;
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": created.id,
                    "status": created.status,
                    "created_at": created.created_at,
                })),
            )
                .into_response()
        }
        Err(e) => engine_error_response("register", e),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub role: Option<String>,
}

pub async fn list_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("registrations", e.into()),
    };

    match registration::list_for_event(&state.pool, event.id, query.role.as_deref()).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => engine_error_response("registrations", e),
    }
}

pub async fn confirm_payment_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(registration_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let confirmed = registration::confirm_payment(
        &state.pool,
        state.confirmations.as_ref(),
        state.credentials.as_ref(),
        &registration_id,
    )
    .await;

    match confirmed {
        Ok(credential) => {
            // The email follows the committed transition; its failure is the
            // dispatcher's problem, not the operator's.
            if let Ok(Some(row)) =
                registration_repo::load_registration(&state.pool, &registration_id).await
            {
                if let Ok(Some(event)) = event_repo::load_event_by_id(&state.pool, row.event_id).await
                {
                    notify_profile(&state, &row.profile_id, &event.name, NotifyKind::Confirmed)
                        .await;
                }
            }
            Json(credential).into_response()
        }
        Err(e) => engine_error_response("confirm payment", e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: String,
}

/// Promote/demote between participant and organizer.
pub async fn role_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(registration_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<RoleBody>,
) -> impl IntoResponse {
    match registration::set_role(&state.pool, &registration_id, &body.role).await {
        Ok(()) => Json(json!({ "id": registration_id, "role": body.role })).into_response(),
        Err(e) => engine_error_response("set role", e),
    }
}

pub async fn delete_handler(
    Extension(_auth): Extension<AuthenticatedProfile>,
    Path(registration_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match registration::delete(&state.pool, &registration_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => engine_error_response("delete registration", e),
    }
}

enum NotifyKind {
    Received,
    Confirmed,
}

async fn notify_profile(state: &AppState, profile_id: &str, event_name: &str, kind: NotifyKind) {
    let profile = match profile_repo::load_profile(&state.pool, profile_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return,
        Err(e) => {
            warn!("notification lookup failed for {}: {}", profile_id, e);
            return;
        }
    };
    let name = format!(
        "{} {}",
        profile.first_name.as_deref().unwrap_or(""),
        profile.last_name.as_deref().unwrap_or("")
    )
    .trim()
    .to_string();
    match kind {
        NotifyKind::Received => {
            state
                .notifier
                .registration_received(profile.email, name, event_name.to_string())
        }
        NotifyKind::Confirmed => {
            state
                .notifier
                .payment_confirmed(profile.email, name, event_name.to_string())
        }
    }
}
