//! Core types for reminders and the email registry.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// The plant-care action a reminder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Water,
    Treatment,
}

impl Action {
    /// The string tag stored in the DB action column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Water => "water",
            Action::Treatment => "treatment",
        }
    }

    /// Capitalized form used in email subjects.
    pub fn subject_word(&self) -> &'static str {
        match self {
            Action::Water => "Water",
            Action::Treatment => "Treatment",
        }
    }

    /// Parse an action tag, rejecting anything outside the enum.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim() {
            "water" => Ok(Action::Water),
            "treatment" => Ok(Action::Treatment),
            other => Err(ValidationError::InvalidAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted plant-care reminder. One-shot: deleted after the dispatch
/// attempt, whether or not delivery succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub email: String,
    pub plant_name: String,
    pub action: Action,
    pub schedule_date: DateTime<Utc>,
    pub remedy_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A mailing-list registry record. Not an authentication identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailUser {
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Raw reminder-creation input, as received from the API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDraft {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub plant_name: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub schedule_date: String,
    #[serde(default)]
    pub remedy_text: Option<String>,
}

/// A draft that passed validation: typed action, parsed instant,
/// normalized email.
#[derive(Debug, Clone)]
pub struct ValidReminder {
    pub email: String,
    pub plant_name: String,
    pub action: Action,
    pub schedule_date: DateTime<Utc>,
    pub remedy_text: Option<String>,
}

impl ReminderDraft {
    /// Validate required fields, the action tag, and the schedule date.
    pub fn validate(&self) -> Result<ValidReminder, ValidationError> {
        let email = normalize_email(&self.email);
        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }

        let plant_name = self.plant_name.trim();
        if plant_name.is_empty() {
            return Err(ValidationError::MissingField("plantName"));
        }

        if self.action.trim().is_empty() {
            return Err(ValidationError::MissingField("action"));
        }
        let action = Action::parse(&self.action)?;

        if self.schedule_date.trim().is_empty() {
            return Err(ValidationError::MissingField("scheduleDate"));
        }
        let schedule_date = parse_schedule_date(&self.schedule_date)?;

        let remedy_text = self
            .remedy_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(ValidReminder {
            email,
            plant_name: plant_name.to_string(),
            action,
            schedule_date,
            remedy_text,
        })
    }
}

/// Lowercase + trim, the normalization applied to every stored email column.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Parse a schedule date from the wire.
///
/// Accepts RFC 3339 (offsets are converted to UTC) and naive
/// `YYYY-MM-DDTHH:MM[:SS]` / `YYYY-MM-DD HH:MM[:SS]` forms, read as UTC.
pub fn parse_schedule_date(s: &str) -> Result<DateTime<Utc>, ValidationError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt.and_utc());
        }
    }
    Err(ValidationError::InvalidScheduleDate(s.to_string()))
}

/// Truncate an instant to minute precision (seconds and sub-seconds zeroed).
pub fn truncate_to_minute(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// Canonical storage format for timestamps: RFC 3339, whole seconds, `Z`.
///
/// A fixed width and a single timezone spelling keep lexicographic string
/// comparison equivalent to instant comparison in SQL range queries.
pub fn to_store_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
