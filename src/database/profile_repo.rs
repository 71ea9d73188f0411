use sqlx::SqlitePool;

use crate::models::ProfilesRow;

pub const SQL_LOAD_PROFILE: &str = r#"
SELECT id, first_name, last_name, phone_number, email
FROM profiles
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_profile(pool: &SqlitePool, profile_id: &str) -> sqlx::Result<Option<ProfilesRow>> {
    sqlx::query_as::<_, ProfilesRow>(SQL_LOAD_PROFILE)
        .bind(profile_id)
        .fetch_optional(pool)
        .await
}

pub struct NewProfile<'a> {
    pub id: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: &'a str,
    pub email: Option<&'a str>,
}

// The id comes from the identity provider (JWT sub); a re-submit for an
// already known profile refreshes the name fields instead of failing.
pub const SQL_UPSERT_PROFILE: &str = r#"
INSERT INTO profiles (id, first_name, last_name, phone_number, email)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(id) DO UPDATE SET
  first_name = excluded.first_name,
  last_name = excluded.last_name,
  phone_number = excluded.phone_number
"#;

pub async fn upsert_profile(pool: &SqlitePool, profile: NewProfile<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPSERT_PROFILE)
        .bind(profile.id)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.phone_number)
        .bind(profile.email)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
