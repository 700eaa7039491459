//! Persistence layer — libSQL-backed storage for reminders and the email
//! registry.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::ReminderStore;
