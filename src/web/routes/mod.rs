use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::error::EngineError;

pub mod accreditation;
pub mod events;
pub mod raffle;
pub mod registrations;
pub mod scan;

/// One translation from engine outcomes to HTTP, so every handler renders
/// the same shape for the same failure.
pub(crate) fn engine_error_response(context: &str, err: EngineError) -> Response {
    match err {
        EngineError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response(),
        EngineError::NotFound => StatusCode::NOT_FOUND.into_response(),
        EngineError::AlreadyCompleted => (
            StatusCode::OK,
            Json(json!({ "state": "already_completed" })),
        )
            .into_response(),
        EngineError::Conflict => StatusCode::CONFLICT.into_response(),
        EngineError::Credential(detail) => {
            warn!("{context}: credential generation failed: {detail}");
            StatusCode::BAD_GATEWAY.into_response()
        }
        EngineError::Schema(e) => {
            warn!("{context}: form definition invalid: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        EngineError::Persistence(e) => {
            warn!("{context}: storage failure: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
