#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationsRow {
    pub id: String,
    pub event_id: i64,
    pub profile_id: String,
    pub role: String,
    pub status: String,
    pub token: Option<String>,
    pub qr_url: Option<String>,
    pub responses: String,
    pub created_at: String,
}

impl RegistrationsRow {
    pub fn responses_map(&self) -> std::collections::BTreeMap<String, String> {
        serde_json::from_str(&self.responses).unwrap_or_default()
    }
}
