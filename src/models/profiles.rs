#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfilesRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl ProfilesRow {
    /// A profile created as a side effect of OAuth sign-in carries at most a
    /// display name; the stored name is only complete once last_name exists.
    pub fn has_stored_name(&self) -> bool {
        self.last_name.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}
