// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nested workout log upsert.
//!
//! Handles the create/edit workflow:
//! 1. Find the day document for the date (create it if absent)
//! 2. Find the body part in that day (append it if absent)
//! 3. Find the exercise in that body part (append it if absent)
//! 4. Append the set to that exercise
//!
//! Every step asks the store again instead of walking a document loaded in
//! step 1. A per-date lock keeps two writers in this process from both
//! seeing "absent" and creating duplicate branches.

use crate::db::WorkoutStore;
use crate::error::{AppError, Result};
use crate::models::{BodyPartEntry, ExerciseEntry, SetEntry, WorkoutDay, WorkoutEntry};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Shared per-date write locks for use in AppState.
pub type DateLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Which branch of the decision tree an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UpsertOutcome {
    /// No document for the date existed; a new one was inserted.
    CreatedDay,
    /// The day existed but not the body part.
    AddedBodyPart,
    /// The body part existed but not the exercise.
    AddedExercise,
    /// The exercise existed; a set was appended.
    AppendedSet,
}

/// Writes log entries into the date → body part → exercise → set hierarchy.
///
/// The store and the caller's identity are injected per request.
pub struct WorkoutLogUpserter<'a, S> {
    store: &'a S,
    locks: &'a DateLocks,
    /// Username of the session performing the write (for logs)
    actor: &'a str,
}

impl<'a, S: WorkoutStore> WorkoutLogUpserter<'a, S> {
    pub fn new(store: &'a S, locks: &'a DateLocks, actor: &'a str) -> Self {
        Self {
            store,
            locks,
            actor,
        }
    }

    async fn lock_date(&self, date: &str) -> DateGuard<'a> {
        let lock = self
            .locks
            .entry(date.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        DateGuard {
            locks: self.locks,
            date: date.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Lock both dates of an edit, lower date first.
    async fn lock_dates(&self, a: &str, b: &str) -> Vec<DateGuard<'a>> {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };

        let mut guards = vec![self.lock_date(first).await];
        if first != second {
            guards.push(self.lock_date(second).await);
        }
        guards
    }

    /// Record one set. Identical calls each append another set.
    pub async fn upsert(&self, entry: &WorkoutEntry) -> Result<UpsertOutcome> {
        let WorkoutEntry {
            date,
            body_part,
            exercise,
            ..
        } = entry;

        let _guard = self.lock_date(date).await;

        let outcome = if self.store.find_day_by_date(date).await?.is_none() {
            self.store.insert_day(&WorkoutDay::from_entry(entry)).await?;
            UpsertOutcome::CreatedDay
        } else if !self.store.has_body_part(date, body_part).await? {
            let pushed = self
                .store
                .push_body_part(date, BodyPartEntry::from_entry(entry))
                .await?;
            ensure_matched(pushed, entry)?;
            UpsertOutcome::AddedBodyPart
        } else if !self.store.has_exercise(date, body_part, exercise).await? {
            let pushed = self
                .store
                .push_exercise(date, body_part, ExerciseEntry::from_entry(entry))
                .await?;
            ensure_matched(pushed, entry)?;
            UpsertOutcome::AddedExercise
        } else {
            let pushed = self
                .store
                .push_set(date, body_part, exercise, SetEntry::from_entry(entry))
                .await?;
            ensure_matched(pushed, entry)?;
            UpsertOutcome::AppendedSet
        };

        tracing::info!(
            actor = self.actor,
            date = %date,
            body_part = %body_part,
            exercise = %exercise,
            outcome = ?outcome,
            "Workout entry recorded"
        );

        Ok(outcome)
    }

    /// Overwrite a day's date and the first element of each nesting level.
    ///
    /// Which body part, exercise or set the caller meant is not taken into
    /// account: index 0 is always the one rewritten.
    pub async fn edit_by_id(&self, id: &str, entry: &WorkoutEntry) -> Result<WorkoutDay> {
        loop {
            let current = self.store.get_day(id).await?.ok_or_else(|| not_found(id))?;

            let _guards = self.lock_dates(&current.date, &entry.date).await;

            // Re-read under the locks; an upsert may have appended in between.
            let mut day = self.store.get_day(id).await?.ok_or_else(|| not_found(id))?;
            if day.date != current.date {
                // Moved by a concurrent edit; lock its new date instead.
                continue;
            }

            day.apply_positional_edit(entry);
            self.store.replace_day(&day).await?;

            tracing::info!(
                actor = self.actor,
                id,
                old_date = %current.date,
                new_date = %day.date,
                "Workout day edited"
            );

            return Ok(day);
        }
    }
}

/// Holds one date's write lock. Dropping it releases the lock and removes
/// the map entry when no other writer is holding or waiting on it.
struct DateGuard<'a> {
    locks: &'a DateLocks,
    date: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DateGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.date, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Workout day {}", id))
}

/// A `false` push means the day or branch vanished between check and write.
fn ensure_matched(pushed: bool, entry: &WorkoutEntry) -> Result<()> {
    if pushed {
        return Ok(());
    }
    tracing::warn!(
        date = %entry.date,
        body_part = %entry.body_part,
        exercise = %entry.exercise,
        "Workout day changed during upsert"
    );
    Err(AppError::Conflict(format!(
        "Workout day {} changed during update, retry",
        entry.date
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn entry(date: &str, body_part: &str, exercise: &str, reps: &str, weight: &str) -> WorkoutEntry {
        WorkoutEntry {
            date: date.to_string(),
            body_part: body_part.to_string(),
            exercise: exercise.to_string(),
            reps: reps.to_string(),
            weight: weight.to_string(),
        }
    }

    async fn only_day(db: &MemoryDb) -> WorkoutDay {
        let mut days = db.list_days().await.unwrap();
        assert_eq!(days.len(), 1, "expected exactly one day: {days:?}");
        days.remove(0)
    }

    #[tokio::test]
    async fn test_new_date_creates_single_branch() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        let outcome = upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::CreatedDay);
        let day = only_day(&db).await;
        assert_eq!(day.date, "2024-01-01");
        assert_eq!(day.workouts.len(), 1);
        assert_eq!(day.workouts[0].body_part, "legs");
        assert_eq!(day.workouts[0].exercises.len(), 1);
        assert_eq!(day.workouts[0].exercises[0].name, "squat");
        assert_eq!(
            day.workouts[0].exercises[0].sets,
            vec![SetEntry::new("10", "135")]
        );
    }

    #[tokio::test]
    async fn test_same_exercise_appends_sets_in_order() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        let outcome = upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "8", "145"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::AppendedSet);
        let day = only_day(&db).await;
        assert_eq!(day.workouts.len(), 1);
        assert_eq!(day.workouts[0].exercises.len(), 1);
        assert_eq!(
            day.workouts[0].exercises[0].sets,
            vec![SetEntry::new("10", "135"), SetEntry::new("8", "145")]
        );
    }

    #[tokio::test]
    async fn test_identical_submissions_are_not_deduplicated() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");
        let e = entry("2024-01-01", "legs", "squat", "10", "135");

        upserter.upsert(&e).await.unwrap();
        upserter.upsert(&e).await.unwrap();
        upserter.upsert(&e).await.unwrap();

        let day = only_day(&db).await;
        assert_eq!(day.workouts[0].exercises[0].sets.len(), 3);
    }

    #[tokio::test]
    async fn test_new_body_part_appends_to_existing_day() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        let outcome = upserter
            .upsert(&entry("2024-01-01", "back", "row", "12", "95"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::AddedBodyPart);
        let day = only_day(&db).await;
        let parts: Vec<&str> = day.workouts.iter().map(|w| w.body_part.as_str()).collect();
        assert_eq!(parts, vec!["legs", "back"]);
        assert_eq!(
            day.workouts[1].exercises[0].sets,
            vec![SetEntry::new("12", "95")]
        );
    }

    #[tokio::test]
    async fn test_new_exercise_appends_under_existing_body_part() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        let outcome = upserter
            .upsert(&entry("2024-01-01", "legs", "lunge", "12", "40"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::AddedExercise);
        let day = only_day(&db).await;
        assert_eq!(day.workouts.len(), 1);
        let names: Vec<&str> = day.workouts[0]
            .exercises
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["squat", "lunge"]);
    }

    #[tokio::test]
    async fn test_same_exercise_name_under_other_body_part_is_separate() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "stretch", "1", "0"))
            .await
            .unwrap();
        upserter
            .upsert(&entry("2024-01-01", "back", "stretch", "2", "0"))
            .await
            .unwrap();
        let outcome = upserter
            .upsert(&entry("2024-01-01", "back", "stretch", "3", "0"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::AppendedSet);
        let day = only_day(&db).await;
        assert_eq!(day.workouts[0].exercises[0].sets.len(), 1);
        assert_eq!(day.workouts[1].exercises[0].sets.len(), 2);
    }

    #[tokio::test]
    async fn test_dates_are_not_normalized() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        let outcome = upserter
            .upsert(&entry("01/01/2024", "legs", "squat", "10", "135"))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::CreatedDay);
        assert_eq!(db.list_days().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_numbers_stored_verbatim() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "ten", "-1.5kg"))
            .await
            .unwrap();

        let day = only_day(&db).await;
        assert_eq!(
            day.workouts[0].exercises[0].sets[0],
            SetEntry::new("ten", "-1.5kg")
        );
    }

    #[tokio::test]
    async fn test_concurrent_upserts_same_date_do_not_duplicate_branches() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();

        let mut handles = vec![];
        for i in 0..20 {
            let db = db.clone();
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");
                upserter
                    .upsert(&entry("2024-01-01", "legs", "squat", &i.to_string(), "100"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let day = only_day(&db).await;
        assert_eq!(day.workouts.len(), 1);
        assert_eq!(day.workouts[0].exercises.len(), 1);
        assert_eq!(day.workouts[0].exercises[0].sets.len(), 20);
    }

    #[tokio::test]
    async fn test_edit_by_id_rewrites_index_zero() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "8", "145"))
            .await
            .unwrap();
        let id = only_day(&db).await.id;

        let edited = upserter
            .edit_by_id(&id, &entry("2024-01-05", "arms", "curl", "12", "30"))
            .await
            .unwrap();

        assert_eq!(edited.id, id);
        assert_eq!(edited.date, "2024-01-05");
        assert_eq!(edited.workouts[0].body_part, "arms");
        assert_eq!(edited.workouts[0].exercises[0].name, "curl");
        assert_eq!(
            edited.workouts[0].exercises[0].sets,
            vec![SetEntry::new("12", "30"), SetEntry::new("8", "145")]
        );
        assert_eq!(db.get_day(&id).await.unwrap(), Some(edited));
    }

    #[tokio::test]
    async fn test_upsert_after_edit_onto_existing_date() {
        for _ in 0..20 {
            let db = MemoryDb::new();
            let locks = DateLocks::default();
            let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

            upserter
                .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
                .await
                .unwrap();
            upserter
                .upsert(&entry("2024-01-02", "back", "row", "12", "95"))
                .await
                .unwrap();
            let moved = db.find_day_by_date("2024-01-02").await.unwrap().unwrap();
            upserter
                .edit_by_id(&moved.id, &entry("2024-01-01", "back", "row", "12", "95"))
                .await
                .unwrap();

            let outcome = upserter
                .upsert(&entry("2024-01-01", "back", "row", "10", "100"))
                .await
                .unwrap();

            assert_eq!(outcome, UpsertOutcome::AppendedSet);
            let moved = db.get_day(&moved.id).await.unwrap().unwrap();
            assert_eq!(moved.workouts[0].exercises[0].sets.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_lock_entries_released_after_writes() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();

        let mut handles = vec![];
        for i in 0..50 {
            let db = db.clone();
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");
                let date = format!("junk-{}", i % 10);
                upserter
                    .upsert(&entry(&date, "legs", "squat", "1", "1"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(locks.is_empty(), "{} lock entries left", locks.len());

        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");
        let id = db.find_day_by_date("junk-0").await.unwrap().unwrap().id;
        upserter
            .edit_by_id(&id, &entry("junk-moved", "arms", "curl", "1", "1"))
            .await
            .unwrap();
        upserter
            .edit_by_id("missing", &entry("junk-x", "arms", "curl", "1", "1"))
            .await
            .unwrap_err();

        assert!(locks.is_empty(), "{} lock entries left", locks.len());
    }

    #[tokio::test]
    async fn test_lock_dates_holds_both_in_order() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        let guards = upserter.lock_dates("2024-01-09", "2024-01-01").await;
        let dates: Vec<&str> = guards.iter().map(|g| g.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-09"]);
        for date in ["2024-01-01", "2024-01-09"] {
            assert!(locks.get(date).unwrap().try_lock().is_err());
        }
        drop(guards);
        assert!(locks.is_empty());

        let guards = upserter.lock_dates("2024-01-01", "2024-01-01").await;
        assert_eq!(guards.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_waits_for_target_date() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        upserter
            .upsert(&entry("2024-01-01", "legs", "squat", "10", "135"))
            .await
            .unwrap();
        let id = only_day(&db).await.id;

        let held = upserter.lock_date("2024-01-09").await;
        let new_entry = entry("2024-01-09", "arms", "curl", "12", "30");
        let edit = upserter.edit_by_id(&id, &new_entry);
        tokio::pin!(edit);

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(50), &mut edit).await;
        assert!(blocked.is_err(), "edit must wait for the new date's lock");
        assert_eq!(only_day(&db).await.date, "2024-01-01");

        drop(held);
        let edited = edit.await.unwrap();
        assert_eq!(edited.date, "2024-01-09");
    }

    #[tokio::test]
    async fn test_edit_unknown_id_is_not_found() {
        let db = MemoryDb::new();
        let locks = DateLocks::default();
        let upserter = WorkoutLogUpserter::new(&db, &locks, "tester");

        let err = upserter
            .edit_by_id("missing", &entry("2024-01-05", "arms", "curl", "12", "30"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
