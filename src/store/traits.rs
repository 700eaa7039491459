//! `ReminderStore` trait — async interface for reminder persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CreateReminderError, StoreError};
use crate::reminders::{EmailUser, Reminder, ReminderDraft};

/// Backend-agnostic store for reminders and the email registry.
///
/// The store exclusively owns both record types. The scheduler reads and
/// deletes reminders but never creates them; the web layer creates and
/// cancels them.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Validate and persist a new reminder.
    ///
    /// Upserts an `EmailUser` for the draft's address before inserting, so
    /// every recipient ends up in the registry exactly once. Validation runs
    /// first; a rejected draft persists nothing.
    async fn create_reminder(
        &self,
        draft: &ReminderDraft,
    ) -> Result<Reminder, CreateReminderError>;

    /// All reminders scheduled for exactly this minute.
    ///
    /// Both sides of the comparison are truncated to minute precision. This
    /// is an equality match, not a due-or-overdue range: a reminder one
    /// minute early or late does not match.
    async fn find_due(&self, at_minute: DateTime<Utc>) -> Result<Vec<Reminder>, StoreError>;

    /// Delete a reminder by id. Deleting an unknown id is not an error.
    async fn delete_reminder(&self, id: Uuid) -> Result<(), StoreError>;

    /// Pending reminders for one recipient, soonest first.
    async fn list_reminders(&self, email: &str) -> Result<Vec<Reminder>, StoreError>;

    /// Insert-if-absent registry record for an email address.
    async fn register_email(&self, email: &str) -> Result<EmailUser, StoreError>;

    /// Total number of stored reminders.
    async fn count_reminders(&self) -> Result<u64, StoreError>;
}
