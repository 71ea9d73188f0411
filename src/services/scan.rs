use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::{profile_repo, registration_repo};
use crate::error::EngineError;
use crate::services::ledger::ActivityLedger;

/// Camera frames of the same credential arrive in bursts; anything inside
/// this window is the same physical scan.
pub const SCAN_COOLDOWN: Duration = Duration::from_millis(2000);

/// Time-windowed set of recently seen raw token values. Purely a debounce to
/// avoid redundant lookups and duplicate confirmation prompts; the
/// already-completed check and the ledger upsert carry correctness on their
/// own.
pub struct ScanCooldown {
    window: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl ScanCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Records the token and reports whether this decode should be processed.
    /// Expired entries are swept on every touch, so the set stays bounded by
    /// the number of distinct credentials scanned within one window.
    pub fn should_process(&self, token: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap();
        seen.retain(|_, at| now.duration_since(*at) < self.window);

        if seen.contains_key(token) {
            return false;
        }
        seen.insert(token.to_string(), now);
        true
    }
}

impl Default for ScanCooldown {
    fn default() -> Self {
        Self::new(SCAN_COOLDOWN)
    }
}

/// Who the credential belongs to, surfaced before any mutation so staff
/// confirm against a face and a name.
#[derive(Debug, Clone, Serialize)]
pub struct ScannedRegistrant {
    pub registration_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Terminal and intermediate states of one scan event.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Duplicate decode of the same credential within the cooldown window.
    Ignored,
    /// Unknown or stale token; nothing was written.
    NotFound,
    /// The activity was already performed for this registrant. Their name is
    /// surfaced so staff can confirm verbally without a second hand-out.
    AlreadyCompleted { registrant: ScannedRegistrant },
    /// Waiting on an explicit operator yes/no before anything mutates:
    /// activities are physical hand-outs, an accidental scan must not
    /// silently consume inventory. The chosen package rides along for
    /// non-check-in activities.
    AwaitingConfirmation {
        registrant: ScannedRegistrant,
        package: Option<String>,
    },
}

/// Resolves a decoded token against the registration store and the ledger.
/// Read-only: the only state it touches is the cooldown set.
pub async fn resolve(
    pool: &SqlitePool,
    ledger: &ActivityLedger,
    cooldown: &ScanCooldown,
    raw_token: &str,
    activity_name: &str,
) -> Result<ScanOutcome, EngineError> {
    if !cooldown.should_process(raw_token) {
        debug!(token = raw_token, "duplicate decode inside cooldown window");
        return Ok(ScanOutcome::Ignored);
    }

    let Some(registration) = registration_repo::load_registration_by_token(pool, raw_token).await?
    else {
        return Ok(ScanOutcome::NotFound);
    };

    let profile = profile_repo::load_profile(pool, &registration.profile_id).await?;
    let registrant = ScannedRegistrant {
        registration_id: registration.id.clone(),
        first_name: profile.as_ref().and_then(|p| p.first_name.clone()),
        last_name: profile.as_ref().and_then(|p| p.last_name.clone()),
    };

    if ledger.completion(pool, &registration, activity_name).await? {
        return Ok(ScanOutcome::AlreadyCompleted { registrant });
    }

    let package = (activity_name != "check_in")
        .then(|| registration.responses_map().get("package").cloned())
        .flatten();
    Ok(ScanOutcome::AwaitingConfirmation {
        registrant,
        package,
    })
}

/// The operator's explicit yes: records the completion and reaches the
/// terminal state. Cancelling a prompt is simply never calling this.
pub async fn confirm(
    pool: &SqlitePool,
    ledger: &ActivityLedger,
    registration_id: &str,
    activity_name: &str,
) -> Result<ScannedRegistrant, EngineError> {
    let registration = registration_repo::load_registration(pool, registration_id)
        .await?
        .ok_or(EngineError::NotFound)?;

    ledger
        .set_completion(pool, &registration, activity_name, true)
        .await?;

    let profile = profile_repo::load_profile(pool, &registration.profile_id).await?;
    Ok(ScannedRegistrant {
        registration_id: registration.id,
        first_name: profile.as_ref().and_then(|p| p.first_name.clone()),
        last_name: profile.as_ref().and_then(|p| p.last_name.clone()),
    })
}
