// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`WorkoutStore`] is the seam handlers and the upserter are written
//! against. [`Database`] picks a backend at startup: Firestore when a GCP
//! project is configured, otherwise the in-memory store.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{BodyPartEntry, ExerciseEntry, SetEntry, User, WorkoutDay};
use std::future::Future;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// One document per logged date
    pub const WORKOUTS: &str = "workouts";
}

/// Storage operations for workout days and user accounts.
///
/// The `push_*` methods are targeted appends addressed by matching filters;
/// they return `false` when no document matched (for example the day was
/// deleted between the lookup and the write).
pub trait WorkoutStore: Send + Sync {
    /// Find the day document whose `date` equals `date` exactly.
    fn find_day_by_date(
        &self,
        date: &str,
    ) -> impl Future<Output = Result<Option<WorkoutDay>, AppError>> + Send;

    fn has_body_part(
        &self,
        date: &str,
        body_part: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn has_exercise(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn insert_day(&self, day: &WorkoutDay) -> impl Future<Output = Result<(), AppError>> + Send;

    fn push_body_part(
        &self,
        date: &str,
        entry: BodyPartEntry,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn push_exercise(
        &self,
        date: &str,
        body_part: &str,
        entry: ExerciseEntry,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn push_set(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
        set: SetEntry,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Get a day by document ID.
    fn get_day(&self, id: &str)
        -> impl Future<Output = Result<Option<WorkoutDay>, AppError>> + Send;

    /// All days, most recent date first.
    fn list_days(&self) -> impl Future<Output = Result<Vec<WorkoutDay>, AppError>> + Send;

    /// Overwrite a whole day document (keyed by its `id`).
    fn replace_day(&self, day: &WorkoutDay) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Delete a day and everything nested in it. Returns `false` if absent.
    fn delete_day(&self, id: &str) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Delete every day. Returns the number of documents removed.
    fn delete_all_days(&self) -> impl Future<Output = Result<usize, AppError>> + Send;

    fn get_user(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, AppError>> + Send;

    /// Create a user. Returns `false` if the username is already taken.
    fn create_user(&self, user: &User) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// Backend selected at startup.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Connect to Firestore if a project is configured, else use memory.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match &config.gcp_project_id {
            Some(project_id) => Ok(Self::Firestore(FirestoreDb::new(project_id).await?)),
            None => {
                tracing::warn!("GCP_PROJECT_ID not set, using in-memory store (data is not persisted)");
                Ok(Self::Memory(MemoryDb::new()))
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $db:ident => $call:expr) => {
        match $self {
            Database::Firestore($db) => $call.await,
            Database::Memory($db) => $call.await,
        }
    };
}

impl WorkoutStore for Database {
    async fn find_day_by_date(&self, date: &str) -> Result<Option<WorkoutDay>, AppError> {
        dispatch!(self, db => db.find_day_by_date(date))
    }

    async fn has_body_part(&self, date: &str, body_part: &str) -> Result<bool, AppError> {
        dispatch!(self, db => db.has_body_part(date, body_part))
    }

    async fn has_exercise(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
    ) -> Result<bool, AppError> {
        dispatch!(self, db => db.has_exercise(date, body_part, exercise))
    }

    async fn insert_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        dispatch!(self, db => db.insert_day(day))
    }

    async fn push_body_part(&self, date: &str, entry: BodyPartEntry) -> Result<bool, AppError> {
        dispatch!(self, db => db.push_body_part(date, entry))
    }

    async fn push_exercise(
        &self,
        date: &str,
        body_part: &str,
        entry: ExerciseEntry,
    ) -> Result<bool, AppError> {
        dispatch!(self, db => db.push_exercise(date, body_part, entry))
    }

    async fn push_set(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
        set: SetEntry,
    ) -> Result<bool, AppError> {
        dispatch!(self, db => db.push_set(date, body_part, exercise, set))
    }

    async fn get_day(&self, id: &str) -> Result<Option<WorkoutDay>, AppError> {
        dispatch!(self, db => db.get_day(id))
    }

    async fn list_days(&self) -> Result<Vec<WorkoutDay>, AppError> {
        dispatch!(self, db => db.list_days())
    }

    async fn replace_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        dispatch!(self, db => db.replace_day(day))
    }

    async fn delete_day(&self, id: &str) -> Result<bool, AppError> {
        dispatch!(self, db => db.delete_day(id))
    }

    async fn delete_all_days(&self) -> Result<usize, AppError> {
        dispatch!(self, db => db.delete_all_days())
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        dispatch!(self, db => db.get_user(username))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        dispatch!(self, db => db.create_user(user))
    }
}
