use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::database::{event_repo, form_field_repo, profile_repo};
use crate::services::form_schema::{CompiledSchema, FieldKind};
use crate::web::middleware::auth::AuthenticatedProfile;
use crate::web::routes::engine_error_response;
use crate::web::AppState;

#[derive(Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub field_type: &'static str,
    pub required: bool,
    pub options: Vec<String>,
}

/// The field list a registration form should render for the acting profile:
/// the event's own fields, preceded by the profile fields when we don't know
/// the registrant yet.
pub async fn form_fields_handler(
    Extension(auth): Extension<AuthenticatedProfile>,
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let event = match event_repo::load_event_by_slug(&state.pool, &slug).await {
        Ok(Some(event)) => event,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return engine_error_response("form fields", e.into()),
    };

    let rows = match form_field_repo::list_fields_for_event(&state.pool, event.id).await {
        Ok(rows) => rows,
        Err(e) => return engine_error_response("form fields", e.into()),
    };
    let schema = match CompiledSchema::compile(&rows) {
        Ok(schema) => schema,
        Err(e) => return engine_error_response("form fields", e.into()),
    };

    let profile = match profile_repo::load_profile(&state.pool, &auth.id).await {
        Ok(profile) => profile,
        Err(e) => return engine_error_response("form fields", e.into()),
    };
    let schema = if profile.as_ref().is_some_and(|p| p.has_stored_name()) {
        schema
    } else {
        match schema.with_profile_fields() {
            Ok(schema) => schema,
            Err(e) => return engine_error_response("form fields", e.into()),
        }
    };

    let fields: Vec<FieldView> = schema
        .fields()
        .iter()
        .map(|field| FieldView {
            name: field.name.clone(),
            label: field.label.clone(),
            field_type: match field.kind {
                FieldKind::Text => "text",
                FieldKind::Select(_) => "select",
                FieldKind::File => "file",
            },
            required: field.required,
            options: match &field.kind {
                FieldKind::Select(options) => options.clone(),
                _ => Vec::new(),
            },
        })
        .collect();

    Json(fields).into_response()
}
