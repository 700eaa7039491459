//! REST endpoints for reminders and the email registry.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::CreateReminderError;
use crate::reminders::ReminderDraft;
use crate::store::ReminderStore;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ReminderStore>,
}

/// POST /api/reminders/create
///
/// Validates the draft and persists it. Validation problems come back as
/// 400 with a message naming the failed precondition; store failures as 500.
async fn create_reminder(
    State(state): State<ApiState>,
    Json(draft): Json<ReminderDraft>,
) -> impl IntoResponse {
    match state.store.create_reminder(&draft).await {
        Ok(reminder) => Json(json!({
            "success": true,
            "message": "Reminder scheduled successfully!",
            "reminder": reminder,
        }))
        .into_response(),
        Err(CreateReminderError::Validation(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
        Err(CreateReminderError::Store(e)) => {
            tracing::error!("Reminder creation error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server error." })),
            )
                .into_response()
        }
    }
}

/// DELETE /api/reminders/{id}
///
/// Cancellation. Deleting an unknown id still succeeds.
async fn cancel_reminder(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.delete_reminder(id).await {
        Ok(()) => Json(json!({ "success": true, "message": "Reminder cancelled." }))
            .into_response(),
        Err(e) => {
            tracing::error!(reminder = %id, "Reminder cancellation error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server error." })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    email: String,
}

/// GET /api/reminders?email=
async fn list_reminders(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    if params.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "email is required" })),
        )
            .into_response();
    }

    match state.store.list_reminders(&params.email).await {
        Ok(reminders) => {
            Json(json!({ "success": true, "reminders": reminders })).into_response()
        }
        Err(e) => {
            tracing::error!("Reminder list error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server error." })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct RegisterEmailBody {
    #[serde(default)]
    email: String,
}

/// POST /api/users/registerEmail
async fn register_email(
    State(state): State<ApiState>,
    Json(body): Json<RegisterEmailBody>,
) -> impl IntoResponse {
    if body.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Email is required" })),
        )
            .into_response();
    }

    match state.store.register_email(&body.email).await {
        Ok(_) => Json(json!({ "success": true, "message": "Email registered successfully" }))
            .into_response(),
        Err(e) => {
            tracing::error!("Email register error: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server error" })),
            )
                .into_response()
        }
    }
}

/// GET / — health check.
async fn health() -> &'static str {
    "🌿 VrikZo backend is running"
}

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/reminders/create", post(create_reminder))
        .route("/api/reminders", get(list_reminders))
        .route("/api/reminders/{id}", delete(cancel_reminder))
        .route("/api/users/registerEmail", post(register_email))
        .with_state(state)
}
