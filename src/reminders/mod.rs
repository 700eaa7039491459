//! Reminder domain model.

pub mod model;

pub use model::{Action, EmailUser, Reminder, ReminderDraft, ValidReminder};
