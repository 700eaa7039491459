//! VrikZo reminders — plant-care reminder scheduling and delivery.

pub mod config;
pub mod error;
pub mod llm;
pub mod notify;
pub mod reminders;
pub mod scheduler;
pub mod store;
pub mod web;
