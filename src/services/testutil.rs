use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{activity_repo, event_repo, profile_repo, registration_repo, schema};
use crate::models::{EventsRow, RegistrationsRow};
use crate::services::credential::{CredentialError, CredentialImages};

pub struct Fixture {
    pub pool: SqlitePool,
    pub event: EventsRow,
}

// One connection keeps the in-memory database shared across all users of the
// pool.
pub async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    schema::init(&pool).await.unwrap();
    pool
}

pub async fn fixture() -> Fixture {
    let pool = pool().await;
    let event_id = event_repo::insert_event(&pool, "devfest-25", "DevFest Sucre 2025")
        .await
        .unwrap();
    activity_repo::seed_catalogue(&pool, event_id).await.unwrap();
    let event = event_repo::load_event_by_slug(&pool, "devfest-25")
        .await
        .unwrap()
        .unwrap();
    Fixture { pool, event }
}

pub async fn insert_profile(fixture: &Fixture, profile_id: &str) {
    profile_repo::upsert_profile(
        &fixture.pool,
        profile_repo::NewProfile {
            id: profile_id,
            first_name: "Ada",
            last_name: "Lovelace",
            phone_number: "70000000",
            email: Some("ada@example.test"),
        },
    )
    .await
    .unwrap();
}

pub async fn insert_registration(fixture: &Fixture, profile_id: &str) -> RegistrationsRow {
    insert_profile(fixture, profile_id).await;
    let id = Uuid::new_v4().to_string();
    registration_repo::insert_registration(
        &fixture.pool,
        registration_repo::NewRegistration {
            id: &id,
            event_id: fixture.event.id,
            profile_id,
            role: "Participant",
            responses: r#"{"package":"full"}"#,
        },
    )
    .await
    .unwrap();
    registration_repo::load_registration(&fixture.pool, &id)
        .await
        .unwrap()
        .unwrap()
}

/// Credential double that counts invocations; render never fails.
#[derive(Default)]
pub struct CountingCredentials {
    pub calls: AtomicUsize,
}

impl CountingCredentials {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialImages for CountingCredentials {
    async fn render(&self, _token: &str, registration_id: &str) -> Result<String, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://assets.test/qr/{}.png", registration_id))
    }
}

/// Credential double that always fails, for exercising the no-commit path.
pub struct FailingCredentials;

impl CredentialImages for FailingCredentials {
    async fn render(&self, _token: &str, _registration_id: &str) -> Result<String, CredentialError> {
        Err(CredentialError("upstream unavailable".to_string()))
    }
}
