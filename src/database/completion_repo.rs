use sqlx::SqlitePool;

// The single authoritative write for accreditation state. Concurrent
// confirmations for the same (registration, activity) settle on one row with
// the last-written value; repeats are no-ops at the data level.
pub const SQL_UPSERT_COMPLETION: &str = r#"
INSERT INTO activity_completions (registration_id, activity_id, completed)
VALUES (?1, ?2, ?3)
ON CONFLICT(registration_id, activity_id) DO UPDATE SET
  completed = excluded.completed
"#;

pub async fn upsert_completion(
    pool: &SqlitePool,
    registration_id: &str,
    activity_id: i64,
    completed: bool,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPSERT_COMPLETION)
        .bind(registration_id)
        .bind(activity_id)
        .bind(completed)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub const SQL_GET_COMPLETION: &str = r#"
SELECT completed
FROM activity_completions
WHERE registration_id = ?1 AND activity_id = ?2
LIMIT 1
"#;

// Absence of a row reads as not completed.
pub async fn get_completion(
    pool: &SqlitePool,
    registration_id: &str,
    activity_id: i64,
) -> sqlx::Result<bool> {
    let completed: Option<i64> = sqlx::query_scalar(SQL_GET_COMPLETION)
        .bind(registration_id)
        .bind(activity_id)
        .fetch_optional(pool)
        .await?;
    Ok(completed.unwrap_or(0) != 0)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompletionListingRow {
    pub registration_id: String,
    pub activity_name: String,
    pub completed: i64,
}

pub const SQL_LIST_COMPLETIONS_FOR_EVENT: &str = r#"
SELECT
  c.registration_id,
  a.name AS activity_name,
  c.completed
FROM activity_completions c
JOIN activities a ON a.id = c.activity_id
WHERE a.event_id = ?1
"#;

pub async fn list_completions_for_event(
    pool: &SqlitePool,
    event_id: i64,
) -> sqlx::Result<Vec<CompletionListingRow>> {
    sqlx::query_as::<_, CompletionListingRow>(SQL_LIST_COMPLETIONS_FOR_EVENT)
        .bind(event_id)
        .fetch_all(pool)
        .await
}
