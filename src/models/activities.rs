// Fixed per-event accreditation catalogue (check_in, package_delivered,
// lunch, refreshment).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivitiesRow {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
}
