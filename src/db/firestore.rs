// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Workout days (one document per date, nested body parts/exercises/sets)
//! - Users (account storage)
//!
//! Firestore cannot address elements of an array of maps, so the targeted
//! `push_*` appends are read-modify-write of the date's document. Callers
//! that need them serialized hold the per-date lock in
//! [`crate::services::upsert`].

use crate::db::{collections, WorkoutStore};
use crate::error::AppError;
use crate::models::{BodyPartEntry, ExerciseEntry, SetEntry, User, WorkoutDay};
use futures_util::TryStreamExt;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Read the day for `date`, let `f` change it, and write it back.
    ///
    /// Returns `false` without writing when no day matches or `f` reports
    /// that its target was missing.
    async fn modify_by_date<F>(&self, date: &str, f: F) -> Result<bool, AppError>
    where
        F: FnOnce(&mut WorkoutDay) -> bool + Send,
    {
        let Some(mut day) = self.find_day_by_date(date).await? else {
            return Ok(false);
        };

        if !f(&mut day) {
            return Ok(false);
        }

        self.replace_day(&day).await?;
        Ok(true)
    }

    /// Batch delete documents using transactions.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

impl WorkoutStore for FirestoreDb {
    // ─── Workout Day Lookups ─────────────────────────────────────

    async fn find_day_by_date(&self, date: &str) -> Result<Option<WorkoutDay>, AppError> {
        let days: Vec<WorkoutDay> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .filter(|q| q.field("date").eq(date))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(days.into_iter().next())
    }

    async fn has_body_part(&self, date: &str, body_part: &str) -> Result<bool, AppError> {
        Ok(self
            .find_day_by_date(date)
            .await?
            .is_some_and(|day| day.has_body_part(body_part)))
    }

    async fn has_exercise(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .find_day_by_date(date)
            .await?
            .is_some_and(|day| day.has_exercise(body_part, exercise)))
    }

    // ─── Workout Day Writes ──────────────────────────────────────

    async fn insert_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUTS)
            .document_id(&day.id)
            .object(day)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn push_body_part(&self, date: &str, entry: BodyPartEntry) -> Result<bool, AppError> {
        self.modify_by_date(date, |day| {
            day.workouts.push(entry);
            true
        })
        .await
    }

    async fn push_exercise(
        &self,
        date: &str,
        body_part: &str,
        entry: ExerciseEntry,
    ) -> Result<bool, AppError> {
        self.modify_by_date(date, |day| match day.body_part_mut(body_part) {
            Some(bp) => {
                bp.exercises.push(entry);
                true
            }
            None => false,
        })
        .await
    }

    async fn push_set(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
        set: SetEntry,
    ) -> Result<bool, AppError> {
        self.modify_by_date(date, |day| {
            match day
                .body_part_mut(body_part)
                .and_then(|bp| bp.exercise_mut(exercise))
            {
                Some(ex) => {
                    ex.sets.push(set);
                    true
                }
                None => false,
            }
        })
        .await
    }

    async fn get_day(&self, id: &str) -> Result<Option<WorkoutDay>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUTS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_days(&self) -> Result<Vec<WorkoutDay>, AppError> {
        let days = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .order_by([("date", firestore::FirestoreQueryDirection::Descending)])
            .obj::<WorkoutDay>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        days.try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn replace_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUTS)
            .document_id(&day.id)
            .object(day)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_day(&self, id: &str) -> Result<bool, AppError> {
        if self.get_day(id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WORKOUTS)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(id, "Deleted workout day");
        Ok(true)
    }

    async fn delete_all_days(&self) -> Result<usize, AppError> {
        let ids: Vec<String> = self.list_days().await?.into_iter().map(|d| d.id).collect();

        self.batch_delete(&ids, collections::WORKOUTS).await?;

        tracing::info!(count = ids.len(), "Deleted all workout days");
        Ok(ids.len())
    }

    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(username)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        if self.get_user(&user.username).await?.is_some() {
            return Ok(false);
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.username)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }
}
