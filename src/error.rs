//! Error types for the reminder service.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Reminder-creation input errors. Each variant names the precondition
/// that failed; surfaced to the caller as a 400.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid action '{0}': expected 'water' or 'treatment'")]
    InvalidAction(String),

    #[error("invalid scheduleDate '{0}'")]
    InvalidScheduleDate(String),
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// What can go wrong when creating a reminder: bad input (400) or a
/// store failure (500). Validation runs first, so a rejected draft
/// leaves no record behind.
#[derive(Debug, thiserror::Error)]
pub enum CreateReminderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Text-generation upstream errors. All of these are recovered locally
/// by the composer's static fallback.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation endpoint returned status {0}")]
    Status(u16),

    #[error("generation returned an empty completion")]
    Empty,

    #[error("unexpected generation response shape: {0}")]
    InvalidResponse(String),
}

/// Outbound mail errors. The dispatcher makes exactly one attempt per
/// call; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid mail address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    BuildMessage(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
