#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventsRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
}
