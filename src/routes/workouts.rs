// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout log routes for authenticated users.

use crate::db::WorkoutStore;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{WorkoutDay, WorkoutEntry};
use crate::services::{UpsertOutcome, WorkoutLogUpserter};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Workout routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/workouts", get(list_days).post(create_entry))
        .route("/api/workouts/delete_all", post(delete_all))
        .route(
            "/api/workouts/{id}",
            get(get_day)
                .post(edit_day)
                .put(edit_day)
                .delete(delete_day),
        )
        .route("/api/workouts/{id}/delete", post(delete_day))
        .route("/api/debug/dump", get(dump))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub message: String,
    pub username: String,
}

async fn dashboard(Extension(user): Extension<AuthUser>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        message: "Welcome to the dashboard!".to_string(),
        username: user.username,
    })
}

// ─── Reading ─────────────────────────────────────────────────

/// All logged days, most recent date first.
async fn list_days(State(state): State<Arc<AppState>>) -> Result<Json<Vec<WorkoutDay>>> {
    let days = state.db.list_days().await?;
    tracing::debug!(count = days.len(), "Fetched workout days");
    Ok(Json(days))
}

async fn get_day(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDay>> {
    state
        .db
        .get_day(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Workout day {}", id)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DumpResponse {
    pub count: usize,
    pub days: Vec<WorkoutDay>,
}

/// Diagnostic dump: logs every stored document and returns them.
async fn dump(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DumpResponse>> {
    let days = state.db.list_days().await?;

    for day in &days {
        tracing::info!(
            id = %day.id,
            date = %day.date,
            document = ?day,
            "Workout day document"
        );
    }
    tracing::info!(requested_by = %user.username, count = days.len(), "Database dump complete");

    Ok(Json(DumpResponse {
        count: days.len(),
        days,
    }))
}

// ─── Writing ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateEntryResponse {
    pub outcome: UpsertOutcome,
    /// The date's document after the write
    pub day: Option<WorkoutDay>,
}

/// Record one set, creating the day/body part/exercise as needed.
async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(entry): Json<WorkoutEntry>,
) -> Result<(StatusCode, Json<CreateEntryResponse>)> {
    let upserter = WorkoutLogUpserter::new(&state.db, &state.date_locks, &user.username);
    let outcome = upserter.upsert(&entry).await?;

    let day = state.db.find_day_by_date(&entry.date).await?;

    Ok((StatusCode::CREATED, Json(CreateEntryResponse { outcome, day })))
}

/// Overwrite the date and the first body part/exercise/set of a day.
async fn edit_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(entry): Json<WorkoutEntry>,
) -> Result<Json<WorkoutDay>> {
    let upserter = WorkoutLogUpserter::new(&state.db, &state.date_locks, &user.username);
    let day = upserter.edit_by_id(&id, &entry).await?;
    Ok(Json(day))
}

async fn delete_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.db.delete_day(&id).await? {
        return Err(AppError::NotFound(format!("Workout day {}", id)));
    }

    tracing::info!(actor = %user.username, id = %id, "Workout day deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAllResponse {
    pub deleted: usize,
}

/// Remove every logged day.
async fn delete_all(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAllResponse>> {
    let deleted = state.db.delete_all_days().await?;

    tracing::warn!(actor = %user.username, deleted, "All workout days deleted");
    Ok(Json(DeleteAllResponse { deleted }))
}
