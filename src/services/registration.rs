use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::{form_field_repo, profile_repo, registration_repo};
use crate::error::EngineError;
use crate::models::{EventsRow, RegistrationsRow};
use crate::services::credential::CredentialImages;
use crate::services::form_schema::{CompiledSchema, FieldError};

pub const ROLE_PARTICIPANT: &str = "Participant";
pub const ROLE_ORGANIZER: &str = "Organizer";

// No 0/O/1/I: tokens get read aloud and typed by hand when a camera fails.
pub const TOKEN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const TOKEN_LEN: usize = 6;

const MAX_TOKEN_ATTEMPTS: usize = 32;
const MAX_CONFIRM_ATTEMPTS: usize = 3;

pub fn generate_token<R: Rng>(rng: &mut R) -> String {
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Picks a token not yet present in storage, regenerating on collision. The
/// UNIQUE column remains the backstop for candidates that collide between
/// this check and the commit.
async fn unique_token<F>(pool: &SqlitePool, mut next: F) -> Result<String, EngineError>
where
    F: FnMut() -> String + Send,
{
    for _ in 0..MAX_TOKEN_ATTEMPTS {
        let candidate = next();
        if !registration_repo::token_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(EngineError::Conflict)
}

/// Serializes confirmation attempts within this process so the credential
/// collaborator runs once per registration even when an operator
/// double-clicks. Across processes the conditional token write is the
/// authority.
pub struct ConfirmationGuard {
    lock: tokio::sync::Mutex<()>,
}

impl Default for ConfirmationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGuard {
    pub fn new() -> Self {
        Self {
            lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedCredential {
    pub token: String,
    pub qr_url: Option<String>,
}

/// Validates a submission against the event's compiled schema and persists a
/// pending registration. For first-time registrants the profile row is
/// created before the registration; if that insert fails the submission
/// fails whole, leaving no orphan registration.
pub async fn submit(
    pool: &SqlitePool,
    event: &EventsRow,
    profile_id: &str,
    profile_email: Option<&str>,
    role: &str,
    raw_values: &HashMap<String, String>,
) -> Result<RegistrationsRow, EngineError> {
    let rows = form_field_repo::list_fields_for_event(pool, event.id).await?;
    let schema = CompiledSchema::compile(&rows)?;

    let profile = profile_repo::load_profile(pool, profile_id).await?;
    let needs_profile = !profile.as_ref().is_some_and(|p| p.has_stored_name());
    let schema = if needs_profile {
        schema.with_profile_fields()?
    } else {
        schema
    };

    let normalized = schema.validate(raw_values).map_err(EngineError::Validation)?;

    let mut responses = normalized;
    if needs_profile {
        let first_name = responses.remove("first_name").unwrap_or_default();
        let last_name = responses.remove("last_name").unwrap_or_default();
        let phone_number = responses.remove("phone_number").unwrap_or_default();
        profile_repo::upsert_profile(
            pool,
            profile_repo::NewProfile {
                id: profile_id,
                first_name: &first_name,
                last_name: &last_name,
                phone_number: &phone_number,
                email: profile_email,
            },
        )
        .await?;
    }

    let responses_json = serde_json::to_string(&responses).unwrap_or_else(|_| "{}".to_string());

    let registration_id = Uuid::new_v4().to_string();
    registration_repo::insert_registration(
        pool,
        registration_repo::NewRegistration {
            id: &registration_id,
            event_id: event.id,
            profile_id,
            role,
            responses: &responses_json,
        },
    )
    .await?;

    info!(registration_id = %registration_id, event = %event.slug, "registration submitted");

    registration_repo::load_registration(pool, &registration_id)
        .await?
        .ok_or(EngineError::NotFound)
}

/// Confirms payment for a registration, issuing its one-time credential.
/// Idempotent: a replayed confirmation returns the already-issued token and
/// performs no further side effects. If credential generation fails nothing
/// commits and the registration stays pending, so the operation is safe to
/// retry.
pub async fn confirm_payment<C: CredentialImages>(
    pool: &SqlitePool,
    guard: &ConfirmationGuard,
    credentials: &C,
    registration_id: &str,
) -> Result<ConfirmedCredential, EngineError> {
    let registration = registration_repo::load_registration(pool, registration_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    if let Some(token) = registration.token {
        return Ok(ConfirmedCredential {
            token,
            qr_url: registration.qr_url,
        });
    }

    let _held = guard.lock.lock().await;

    // Another confirmation may have won while we waited for the guard.
    let registration = registration_repo::load_registration(pool, registration_id)
        .await?
        .ok_or(EngineError::NotFound)?;
    if let Some(token) = registration.token {
        return Ok(ConfirmedCredential {
            token,
            qr_url: registration.qr_url,
        });
    }

    for _ in 0..MAX_CONFIRM_ATTEMPTS {
        let token = unique_token(pool, || generate_token(&mut rand::thread_rng())).await?;

        let qr_url = credentials
            .render(&token, registration_id)
            .await
            .map_err(|e| EngineError::Credential(e.to_string()))?;

        match registration_repo::confirm_if_unclaimed(pool, &token, &qr_url, registration_id).await
        {
            Ok(0) => {
                // Lost a cross-process race; converge on the committed token.
                let current = registration_repo::load_registration(pool, registration_id)
                    .await?
                    .ok_or(EngineError::NotFound)?;
                return match current.token {
                    Some(token) => Ok(ConfirmedCredential {
                        token,
                        qr_url: current.qr_url,
                    }),
                    None => Err(EngineError::Conflict),
                };
            }
            Ok(_) => {
                info!(registration_id, token = %token, "payment confirmed, credential issued");
                return Ok(ConfirmedCredential {
                    token,
                    qr_url: Some(qr_url),
                });
            }
            // Token collided with a commit that happened after our existence
            // check; regenerate and try again.
            Err(e) if is_unique_violation(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(EngineError::Conflict)
}

/// Promotes or demotes a registration between the participant and organizer
/// roles.
pub async fn set_role(
    pool: &SqlitePool,
    registration_id: &str,
    role: &str,
) -> Result<(), EngineError> {
    if role != ROLE_PARTICIPANT && role != ROLE_ORGANIZER {
        return Err(EngineError::Validation(vec![FieldError {
            field: "role".to_string(),
            message: format!("role must be {ROLE_PARTICIPANT} or {ROLE_ORGANIZER}"),
        }]));
    }
    let affected = registration_repo::update_role(pool, role, registration_id).await?;
    if affected == 0 {
        return Err(EngineError::NotFound);
    }
    Ok(())
}

pub async fn delete(pool: &SqlitePool, registration_id: &str) -> Result<(), EngineError> {
    let affected = registration_repo::delete_registration(pool, registration_id).await?;
    if affected == 0 {
        return Err(EngineError::NotFound);
    }
    Ok(())
}

/// Admin listing: profile name fields joined in and responses flattened to
/// top-level keys, the shape the registration tables render.
#[derive(Debug, Serialize)]
pub struct RegistrationSummary {
    pub id: String,
    pub role: String,
    pub status: String,
    pub token: Option<String>,
    pub qr_url: Option<String>,
    pub created_at: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub responses: BTreeMap<String, String>,
}

pub async fn list_for_event(
    pool: &SqlitePool,
    event_id: i64,
    role: Option<&str>,
) -> Result<Vec<RegistrationSummary>, EngineError> {
    let rows = registration_repo::list_registrations_for_event(pool, event_id, role).await?;
    Ok(rows
        .into_iter()
        .map(|row| RegistrationSummary {
            id: row.id,
            role: row.role,
            status: row.status,
            token: row.token,
            qr_url: row.qr_url,
            created_at: row.created_at,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            email: row.email,
            responses: serde_json::from_str(&row.responses).unwrap_or_default(),
        })
        .collect())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
