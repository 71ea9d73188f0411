use sqlx::SqlitePool;

use crate::models::FormFieldRow;

pub const SQL_LIST_FIELDS_FOR_EVENT: &str = r#"
SELECT id, event_id, name, label, field_type, required, options, position
FROM form_fields
WHERE event_id = ?1
ORDER BY position, id
"#;

pub async fn list_fields_for_event(
    pool: &SqlitePool,
    event_id: i64,
) -> sqlx::Result<Vec<FormFieldRow>> {
    sqlx::query_as::<_, FormFieldRow>(SQL_LIST_FIELDS_FOR_EVENT)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

pub struct NewFormField<'a> {
    pub event_id: i64,
    pub name: &'a str,
    pub label: &'a str,
    pub field_type: &'a str,
    pub required: bool,
    pub options: Option<&'a str>,
    pub position: i64,
}

pub const SQL_INSERT_FORM_FIELD: &str = r#"
INSERT INTO form_fields (event_id, name, label, field_type, required, options, position)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub async fn insert_form_field(pool: &SqlitePool, field: NewFormField<'_>) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_FORM_FIELD)
        .bind(field.event_id)
        .bind(field.name)
        .bind(field.label)
        .bind(field.field_type)
        .bind(field.required)
        .bind(field.options)
        .bind(field.position)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}
