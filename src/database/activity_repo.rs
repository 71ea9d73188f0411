use sqlx::SqlitePool;

use crate::models::ActivitiesRow;

// Catalogue seeded for every new event; organizers can extend it per event.
pub const DEFAULT_ACTIVITY_NAMES: &[&str] =
    &["check_in", "package_delivered", "lunch", "refreshment"];

pub const SQL_LIST_ACTIVITIES_FOR_EVENT: &str = r#"
SELECT id, event_id, name
FROM activities
WHERE event_id = ?1
ORDER BY id
"#;

pub async fn list_activities_for_event(
    pool: &SqlitePool,
    event_id: i64,
) -> sqlx::Result<Vec<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LIST_ACTIVITIES_FOR_EVENT)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

pub const SQL_FIND_ACTIVITY_ID: &str = r#"
SELECT id FROM activities WHERE event_id = ?1 AND name = ?2 LIMIT 1
"#;

pub async fn find_activity_id(
    pool: &SqlitePool,
    event_id: i64,
    name: &str,
) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(SQL_FIND_ACTIVITY_ID)
        .bind(event_id)
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (event_id, name) VALUES (?1, ?2)
ON CONFLICT(event_id, name) DO NOTHING
"#;

pub async fn seed_catalogue(pool: &SqlitePool, event_id: i64) -> sqlx::Result<()> {
    for name in DEFAULT_ACTIVITY_NAMES {
        sqlx::query(SQL_INSERT_ACTIVITY)
            .bind(event_id)
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}
