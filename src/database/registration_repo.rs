use sqlx::SqlitePool;

use crate::models::RegistrationsRow;

const REGISTRATION_COLUMNS: &str =
    "id, event_id, profile_id, role, status, token, qr_url, responses, created_at";

pub struct NewRegistration<'a> {
    pub id: &'a str,
    pub event_id: i64,
    pub profile_id: &'a str,
    pub role: &'a str,
    pub responses: &'a str,
}

pub const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (id, event_id, profile_id, role, status, responses)
VALUES (?1, ?2, ?3, ?4, 'pending', ?5)
"#;

pub async fn insert_registration(
    pool: &SqlitePool,
    registration: NewRegistration<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(registration.id)
        .bind(registration.event_id)
        .bind(registration.profile_id)
        .bind(registration.role)
        .bind(registration.responses)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn load_registration(
    pool: &SqlitePool,
    registration_id: &str,
) -> sqlx::Result<Option<RegistrationsRow>> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = ?1 LIMIT 1"
    );
    sqlx::query_as::<_, RegistrationsRow>(&sql)
        .bind(registration_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_registration_by_token(
    pool: &SqlitePool,
    token: &str,
) -> sqlx::Result<Option<RegistrationsRow>> {
    let sql = format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE token = ?1 LIMIT 1"
    );
    sqlx::query_as::<_, RegistrationsRow>(&sql)
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub const SQL_TOKEN_EXISTS: &str = r#"
SELECT COUNT(1) FROM registrations WHERE token = ?1
"#;

pub async fn token_exists(pool: &SqlitePool, token: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_TOKEN_EXISTS)
        .bind(token)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

// The WHERE token IS NULL guard is the authoritative race protection: of any
// number of concurrent confirmations, exactly one affects a row.
pub const SQL_CONFIRM_IF_UNCLAIMED: &str = r#"
UPDATE registrations
SET status = 'confirmed', token = ?1, qr_url = ?2
WHERE id = ?3 AND token IS NULL
"#;

pub async fn confirm_if_unclaimed(
    pool: &SqlitePool,
    token: &str,
    qr_url: &str,
    registration_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CONFIRM_IF_UNCLAIMED)
        .bind(token)
        .bind(qr_url)
        .bind(registration_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub const SQL_UPDATE_ROLE: &str = r#"
UPDATE registrations SET role = ?1 WHERE id = ?2
"#;

pub async fn update_role(
    pool: &SqlitePool,
    role: &str,
    registration_id: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ROLE)
        .bind(role)
        .bind(registration_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub const SQL_DELETE_REGISTRATION: &str = r#"
DELETE FROM registrations WHERE id = ?1
"#;

// Completion rows go with it (ON DELETE CASCADE).
pub async fn delete_registration(pool: &SqlitePool, registration_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_REGISTRATION)
        .bind(registration_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// Admin listing joins the profile name fields the tables render.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationListingRow {
    pub id: String,
    pub role: String,
    pub status: String,
    pub token: Option<String>,
    pub qr_url: Option<String>,
    pub responses: String,
    pub created_at: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

pub const SQL_LIST_REGISTRATIONS_FOR_EVENT: &str = r#"
SELECT
  r.id,
  r.role,
  r.status,
  r.token,
  r.qr_url,
  r.responses,
  r.created_at,
  p.first_name,
  p.last_name,
  p.phone_number,
  p.email
FROM registrations r
JOIN profiles p ON p.id = r.profile_id
WHERE r.event_id = ?1
  AND (?2 IS NULL OR r.role = ?2)
ORDER BY r.created_at DESC, r.id DESC
"#;

pub async fn list_registrations_for_event(
    pool: &SqlitePool,
    event_id: i64,
    role: Option<&str>,
) -> sqlx::Result<Vec<RegistrationListingRow>> {
    sqlx::query_as::<_, RegistrationListingRow>(SQL_LIST_REGISTRATIONS_FOR_EVENT)
        .bind(event_id)
        .bind(role)
        .fetch_all(pool)
        .await
}
