//! libSQL backend — async `ReminderStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CreateReminderError, StoreError};
use crate::reminders::model::{normalize_email, to_store_timestamp, truncate_to_minute};
use crate::reminders::{Action, EmailUser, Reminder, ReminderDraft};
use crate::store::migrations;
use crate::store::traits::ReminderStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(backend.conn()).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn upsert_email_user(&self, email: &str) -> Result<EmailUser, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO email_users (email, created_at) VALUES (?1, ?2)",
            params![email, to_store_timestamp(Utc::now())],
        )
        .await
        .map_err(|e| StoreError::Query(format!("register_email: {e}")))?;

        let mut rows = conn
            .query(
                "SELECT email, created_at FROM email_users WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| StoreError::Query(format!("register_email lookup: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let email: String = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("register_email row: {e}")))?;
                let created_str: String = row
                    .get(1)
                    .map_err(|e| StoreError::Query(format!("register_email row: {e}")))?;
                Ok(EmailUser {
                    email,
                    created_at: parse_datetime(&created_str),
                })
            }
            Ok(None) => Err(StoreError::Query(
                "register_email: upserted row not found".to_string(),
            )),
            Err(e) => Err(StoreError::Query(format!("register_email: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Parse an action tag from the DB. Unknown tags read as `water`.
fn str_to_action(s: &str) -> Action {
    match s {
        "treatment" => Action::Treatment,
        _ => Action::Water,
    }
}

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a Reminder.
///
/// Column order matches REMINDER_COLUMNS:
/// 0:id, 1:email, 2:plant_name, 3:action, 4:schedule_date, 5:remedy_text,
/// 6:created_at
fn row_to_reminder(row: &libsql::Row) -> Result<Reminder, libsql::Error> {
    let id_str: String = row.get(0)?;
    let action_str: String = row.get(3)?;
    let schedule_str: String = row.get(4)?;
    let remedy_text: Option<String> = row.get(5).ok();
    let created_str: String = row.get(6)?;

    Ok(Reminder {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
        email: row.get(1)?,
        plant_name: row.get(2)?,
        action: str_to_action(&action_str),
        schedule_date: parse_datetime(&schedule_str),
        remedy_text,
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const REMINDER_COLUMNS: &str =
    "id, email, plant_name, action, schedule_date, remedy_text, created_at";

#[async_trait]
impl ReminderStore for LibSqlBackend {
    async fn create_reminder(
        &self,
        draft: &ReminderDraft,
    ) -> Result<Reminder, CreateReminderError> {
        let valid = draft.validate()?;

        self.upsert_email_user(&valid.email)
            .await
            .map_err(CreateReminderError::Store)?;

        let reminder = Reminder {
            id: Uuid::new_v4(),
            email: valid.email,
            plant_name: valid.plant_name,
            action: valid.action,
            schedule_date: valid.schedule_date,
            remedy_text: valid.remedy_text,
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO reminders (id, email, plant_name, action, schedule_date, remedy_text, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reminder.id.to_string(),
                    reminder.email.clone(),
                    reminder.plant_name.clone(),
                    reminder.action.as_str(),
                    to_store_timestamp(reminder.schedule_date),
                    opt_text(reminder.remedy_text.as_deref()),
                    to_store_timestamp(reminder.created_at),
                ],
            )
            .await
            .map_err(|e| {
                CreateReminderError::Store(StoreError::Query(format!("create_reminder: {e}")))
            })?;

        debug!(reminder = %reminder.id, email = %reminder.email, "Reminder inserted");
        Ok(reminder)
    }

    async fn find_due(&self, at_minute: DateTime<Utc>) -> Result<Vec<Reminder>, StoreError> {
        let start = truncate_to_minute(at_minute);
        let end = start + chrono::Duration::seconds(60);

        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders WHERE schedule_date >= ?1 AND schedule_date < ?2"
                ),
                params![to_store_timestamp(start), to_store_timestamp(end)],
            )
            .await
            .map_err(|e| StoreError::Query(format!("find_due: {e}")))?;

        let mut due = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("find_due: {e}")))?
        {
            due.push(
                row_to_reminder(&row)
                    .map_err(|e| StoreError::Query(format!("find_due row parse: {e}")))?,
            );
        }
        Ok(due)
    }

    async fn delete_reminder(&self, id: Uuid) -> Result<(), StoreError> {
        self.conn()
            .execute(
                "DELETE FROM reminders WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("delete_reminder: {e}")))?;

        debug!(reminder = %id, "Reminder deleted");
        Ok(())
    }

    async fn list_reminders(&self, email: &str) -> Result<Vec<Reminder>, StoreError> {
        let email = normalize_email(email);
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders WHERE email = ?1 ORDER BY schedule_date ASC"
                ),
                params![email],
            )
            .await
            .map_err(|e| StoreError::Query(format!("list_reminders: {e}")))?;

        let mut reminders = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("list_reminders: {e}")))?
        {
            reminders.push(
                row_to_reminder(&row)
                    .map_err(|e| StoreError::Query(format!("list_reminders row parse: {e}")))?,
            );
        }
        Ok(reminders)
    }

    async fn register_email(&self, email: &str) -> Result<EmailUser, StoreError> {
        let email = normalize_email(email);
        self.upsert_email_user(&email).await
    }

    async fn count_reminders(&self) -> Result<u64, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM reminders", ())
            .await
            .map_err(|e| StoreError::Query(format!("count_reminders: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("count_reminders row: {e}")))?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(StoreError::Query(format!("count_reminders: {e}"))),
        }
    }
}
