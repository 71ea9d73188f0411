// Per-event dynamic form definition, ordered by position. Read-only for the
// engine: organizers edit these rows, registration only snapshots them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FormFieldRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub required: i64,
    pub options: Option<String>,
    pub position: i64,
}
