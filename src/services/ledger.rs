use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::{activity_repo, completion_repo, registration_repo};
use crate::error::EngineError;
use crate::models::RegistrationsRow;

/// Tracks which accreditation activities have been performed for which
/// registrations. Correctness rests entirely on the storage-level upsert;
/// everything in here besides that write is advisory.
///
/// The activity catalogue is static for an event's lifetime, so name→id
/// lookups are cached. The cache is invalidated on mismatch rather than
/// locked: a write against a stale id fails the foreign key check, drops the
/// entry, and resolves again.
pub struct ActivityLedger {
    cache: RwLock<HashMap<(i64, String), i64>>,
}

impl Default for ActivityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn invalidate(&self, event_id: i64) {
        self.cache
            .write()
            .unwrap()
            .retain(|(cached_event, _), _| *cached_event != event_id);
    }

    async fn resolve_activity_id(
        &self,
        pool: &SqlitePool,
        event_id: i64,
        activity_name: &str,
    ) -> Result<i64, EngineError> {
        let key = (event_id, activity_name.to_string());
        if let Some(id) = self.cache.read().unwrap().get(&key) {
            return Ok(*id);
        }

        let id = activity_repo::find_activity_id(pool, event_id, activity_name)
            .await?
            .ok_or(EngineError::NotFound)?;
        self.cache.write().unwrap().insert(key, id);
        Ok(id)
    }

    pub async fn completion(
        &self,
        pool: &SqlitePool,
        registration: &RegistrationsRow,
        activity_name: &str,
    ) -> Result<bool, EngineError> {
        let activity_id = self
            .resolve_activity_id(pool, registration.event_id, activity_name)
            .await?;
        Ok(completion_repo::get_completion(pool, &registration.id, activity_id).await?)
    }

    /// Idempotent: any number of identical calls leaves exactly one row whose
    /// value equals the last write. Were a completion ever to carry an
    /// exactly-once side effect (say, decrementing finite inventory), this
    /// would need to become a single conditional write instead of relying on
    /// upsert convergence.
    pub async fn set_completion(
        &self,
        pool: &SqlitePool,
        registration: &RegistrationsRow,
        activity_name: &str,
        value: bool,
    ) -> Result<(), EngineError> {
        let activity_id = self
            .resolve_activity_id(pool, registration.event_id, activity_name)
            .await?;

        match completion_repo::upsert_completion(pool, &registration.id, activity_id, value).await {
            Ok(_) => Ok(()),
            // Stale cache: the catalogue changed under us and the cached id no
            // longer exists. Fail closed, re-resolve and retry once instead
            // of writing against a wrong id.
            Err(e) if is_foreign_key_violation(&e) => {
                warn!(
                    event_id = registration.event_id,
                    activity = activity_name,
                    "stale activity id in cache, re-resolving"
                );
                self.invalidate(registration.event_id);
                let activity_id = self
                    .resolve_activity_id(pool, registration.event_id, activity_name)
                    .await?;
                completion_repo::upsert_completion(pool, &registration.id, activity_id, value)
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Accreditation table view: every registration of the event with one
    /// boolean per catalogue activity, read straight from committed state.
    pub async fn list_completions(
        &self,
        pool: &SqlitePool,
        event_id: i64,
    ) -> Result<AccreditationList, EngineError> {
        let activities = activity_repo::list_activities_for_event(pool, event_id).await?;
        let registrations =
            registration_repo::list_registrations_for_event(pool, event_id, None).await?;
        let completions = completion_repo::list_completions_for_event(pool, event_id).await?;

        let mut done: HashMap<(String, String), bool> = HashMap::new();
        for row in completions {
            done.insert(
                (row.registration_id.clone(), row.activity_name.clone()),
                row.completed != 0,
            );
        }

        let activity_names: Vec<String> = activities.into_iter().map(|a| a.name).collect();
        let mut completed_counts: BTreeMap<String, i64> = activity_names
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();

        let rows = registrations
            .into_iter()
            .map(|registration| {
                let mut activities = BTreeMap::new();
                for name in &activity_names {
                    let value = done
                        .get(&(registration.id.clone(), name.clone()))
                        .copied()
                        .unwrap_or(false);
                    if value {
                        *completed_counts.get_mut(name).unwrap() += 1;
                    }
                    activities.insert(name.clone(), value);
                }
                let responses: BTreeMap<String, String> =
                    serde_json::from_str(&registration.responses).unwrap_or_default();
                AccreditationEntry {
                    registration_id: registration.id,
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    role: registration.role,
                    status: registration.status,
                    responses,
                    activities,
                }
            })
            .collect();

        Ok(AccreditationList {
            activity_names,
            completed_counts,
            rows,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AccreditationEntry {
    pub registration_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub status: String,
    pub responses: BTreeMap<String, String>,
    pub activities: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct AccreditationList {
    pub activity_names: Vec<String>,
    pub completed_counts: BTreeMap<String, i64>,
    pub rows: Vec<AccreditationEntry>,
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil;

    #[tokio::test]
    async fn missing_row_reads_as_false() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let registration = testutil::insert_registration(&fixture, "p1").await;

        let done = ledger
            .completion(&fixture.pool, &registration, "check_in")
            .await
            .unwrap();
        assert!(!done);
    }

    #[tokio::test]
    async fn set_completion_is_idempotent_at_row_level() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let registration = testutil::insert_registration(&fixture, "p1").await;

        for _ in 0..5 {
            ledger
                .set_completion(&fixture.pool, &registration, "lunch", true)
                .await
                .unwrap();
        }

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM activity_completions WHERE registration_id = ?1",
        )
        .bind(&registration.id)
        .fetch_one(&fixture.pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
        assert!(ledger
            .completion(&fixture.pool, &registration, "lunch")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn read_follows_committed_write() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let registration = testutil::insert_registration(&fixture, "p1").await;

        ledger
            .set_completion(&fixture.pool, &registration, "check_in", true)
            .await
            .unwrap();
        assert!(ledger
            .completion(&fixture.pool, &registration, "check_in")
            .await
            .unwrap());

        ledger
            .set_completion(&fixture.pool, &registration, "check_in", false)
            .await
            .unwrap();
        assert!(!ledger
            .completion(&fixture.pool, &registration, "check_in")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn concurrent_sets_converge_to_one_row() {
        let fixture = testutil::fixture().await;
        let ledger = std::sync::Arc::new(ActivityLedger::new());
        let registration = testutil::insert_registration(&fixture, "p1").await;

        let a = {
            let pool = fixture.pool.clone();
            let ledger = ledger.clone();
            let registration = registration.clone();
            tokio::spawn(async move {
                ledger
                    .set_completion(&pool, &registration, "check_in", true)
                    .await
            })
        };
        let b = {
            let pool = fixture.pool.clone();
            let ledger = ledger.clone();
            let registration = registration.clone();
            tokio::spawn(async move {
                ledger
                    .set_completion(&pool, &registration, "check_in", true)
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let rows: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM activity_completions WHERE registration_id = ?1",
        )
        .bind(&registration.id)
        .fetch_one(&fixture.pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn unknown_activity_is_not_found() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let registration = testutil::insert_registration(&fixture, "p1").await;

        let err = ledger
            .set_completion(&fixture.pool, &registration, "afterparty", true)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound));
    }

    #[tokio::test]
    async fn stale_cached_id_re_resolves_instead_of_failing() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let first = testutil::insert_registration(&fixture, "p1").await;
        let second = testutil::insert_registration(&fixture, "p2").await;

        // Warm the cache, then rebuild the catalogue entry so the cached id
        // points at a row that no longer exists.
        ledger
            .set_completion(&fixture.pool, &first, "refreshment", true)
            .await
            .unwrap();
        sqlx::query("DELETE FROM activity_completions")
            .execute(&fixture.pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM activities WHERE event_id = ?1 AND name = 'refreshment'")
            .bind(fixture.event.id)
            .execute(&fixture.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO activities (event_id, name) VALUES (?1, 'refreshment')")
            .bind(fixture.event.id)
            .execute(&fixture.pool)
            .await
            .unwrap();

        ledger
            .set_completion(&fixture.pool, &second, "refreshment", true)
            .await
            .unwrap();
        assert!(ledger
            .completion(&fixture.pool, &second, "refreshment")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn listing_reflects_latest_committed_state() {
        let fixture = testutil::fixture().await;
        let ledger = ActivityLedger::new();
        let registration = testutil::insert_registration(&fixture, "p1").await;

        ledger
            .set_completion(&fixture.pool, &registration, "check_in", true)
            .await
            .unwrap();

        let listing = ledger
            .list_completions(&fixture.pool, fixture.event.id)
            .await
            .unwrap();
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.rows[0].activities["check_in"], true);
        assert_eq!(listing.rows[0].activities["lunch"], false);
        assert_eq!(listing.completed_counts["check_in"], 1);
        assert_eq!(listing.completed_counts["lunch"], 0);
    }
}
