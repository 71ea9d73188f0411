use sqlx::SqlitePool;

use crate::models::EventsRow;

pub const SQL_LOAD_EVENT_BY_SLUG: &str = r#"
SELECT id, slug, name
FROM events
WHERE slug = ?1
LIMIT 1
"#;

pub async fn load_event_by_slug(pool: &SqlitePool, slug: &str) -> sqlx::Result<Option<EventsRow>> {
    sqlx::query_as::<_, EventsRow>(SQL_LOAD_EVENT_BY_SLUG)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub const SQL_LOAD_EVENT_BY_ID: &str = r#"
SELECT id, slug, name
FROM events
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_event_by_id(pool: &SqlitePool, event_id: i64) -> sqlx::Result<Option<EventsRow>> {
    sqlx::query_as::<_, EventsRow>(SQL_LOAD_EVENT_BY_ID)
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

pub const SQL_INSERT_EVENT: &str = r#"
INSERT INTO events (slug, name) VALUES (?1, ?2)
"#;

pub async fn insert_event(pool: &SqlitePool, slug: &str, name: &str) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_EVENT)
        .bind(slug)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}
