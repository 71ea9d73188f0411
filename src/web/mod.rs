use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::credential::QrUpstream;
use crate::services::email::Notifier;
use crate::services::ledger::ActivityLedger;
use crate::services::registration::ConfirmationGuard;
use crate::services::scan::ScanCooldown;

pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub ledger: Arc<ActivityLedger>,
    pub cooldown: Arc<ScanCooldown>,
    pub confirmations: Arc<ConfirmationGuard>,
    pub credentials: Arc<QrUpstream>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ledger: Arc::new(ActivityLedger::new()),
            cooldown: Arc::new(ScanCooldown::default()),
            confirmations: Arc::new(ConfirmationGuard::new()),
            credentials: Arc::new(QrUpstream::from_env()),
            notifier: Notifier::from_env(),
        }
    }
}
