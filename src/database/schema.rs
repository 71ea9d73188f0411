use sqlx::SqlitePool;

// Schema is applied in-process at startup; every statement is idempotent so
// repeated boots and test pools share one code path.
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS events (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  slug TEXT NOT NULL UNIQUE,
  name TEXT NOT NULL
)
    "#,
    r#"
CREATE TABLE IF NOT EXISTS profiles (
  id TEXT PRIMARY KEY,
  first_name TEXT,
  last_name TEXT,
  phone_number TEXT,
  email TEXT
)
    "#,
    r#"
CREATE TABLE IF NOT EXISTS form_fields (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id INTEGER NOT NULL REFERENCES events(id),
  name TEXT NOT NULL,
  label TEXT NOT NULL,
  field_type TEXT NOT NULL,
  required INTEGER NOT NULL DEFAULT 0,
  options TEXT,
  position INTEGER NOT NULL DEFAULT 0,
  UNIQUE (event_id, name)
)
    "#,
    r#"
CREATE TABLE IF NOT EXISTS registrations (
  id TEXT PRIMARY KEY,
  event_id INTEGER NOT NULL REFERENCES events(id),
  profile_id TEXT NOT NULL REFERENCES profiles(id),
  role TEXT NOT NULL DEFAULT 'Participant',
  status TEXT NOT NULL DEFAULT 'pending',
  token TEXT UNIQUE,
  qr_url TEXT,
  responses TEXT NOT NULL DEFAULT '{}',
  created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
    "#,
    r#"
CREATE TABLE IF NOT EXISTS activities (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id INTEGER NOT NULL REFERENCES events(id),
  name TEXT NOT NULL,
  UNIQUE (event_id, name)
)
    "#,
    r#"
CREATE TABLE IF NOT EXISTS activity_completions (
  registration_id TEXT NOT NULL REFERENCES registrations(id) ON DELETE CASCADE,
  activity_id INTEGER NOT NULL REFERENCES activities(id),
  completed INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY (registration_id, activity_id)
)
    "#,
    "CREATE INDEX IF NOT EXISTS idx_form_fields_event ON form_fields(event_id)",
    "CREATE INDEX IF NOT EXISTS idx_registrations_event ON registrations(event_id)",
];

pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
