// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store used for local development and tests.

use crate::db::WorkoutStore;
use crate::error::AppError;
use crate::models::{BodyPartEntry, ExerciseEntry, SetEntry, User, WorkoutDay};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    /// Day documents keyed by document ID
    days: Arc<DashMap<String, WorkoutDay>>,
    /// Users keyed by username
    users: Arc<DashMap<String, User>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the first day that `matches`. Returns `false` when no
    /// day matched.
    ///
    /// Callers match on the date plus the branch they write into; two
    /// documents may share a date after an edit.
    fn modify_first<P, F>(&self, matches: P, f: F) -> bool
    where
        P: Fn(&WorkoutDay) -> bool,
        F: FnOnce(&mut WorkoutDay),
    {
        match self.days.iter_mut().find(|day| matches(day.value())) {
            Some(mut day) => {
                f(day.value_mut());
                true
            }
            None => false,
        }
    }
}

impl WorkoutStore for MemoryDb {
    async fn find_day_by_date(&self, date: &str) -> Result<Option<WorkoutDay>, AppError> {
        Ok(self
            .days
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.value().clone()))
    }

    async fn has_body_part(&self, date: &str, body_part: &str) -> Result<bool, AppError> {
        Ok(self
            .days
            .iter()
            .any(|day| day.date == date && day.has_body_part(body_part)))
    }

    async fn has_exercise(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .days
            .iter()
            .any(|day| day.date == date && day.has_exercise(body_part, exercise)))
    }

    async fn insert_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        self.days.insert(day.id.clone(), day.clone());
        Ok(())
    }

    async fn push_body_part(&self, date: &str, entry: BodyPartEntry) -> Result<bool, AppError> {
        Ok(self.modify_first(|day| day.date == date, |day| day.workouts.push(entry)))
    }

    async fn push_exercise(
        &self,
        date: &str,
        body_part: &str,
        entry: ExerciseEntry,
    ) -> Result<bool, AppError> {
        Ok(self.modify_first(
            |day| day.date == date && day.has_body_part(body_part),
            |day| {
                if let Some(bp) = day.body_part_mut(body_part) {
                    bp.exercises.push(entry);
                }
            },
        ))
    }

    async fn push_set(
        &self,
        date: &str,
        body_part: &str,
        exercise: &str,
        set: SetEntry,
    ) -> Result<bool, AppError> {
        Ok(self.modify_first(
            |day| day.date == date && day.has_exercise(body_part, exercise),
            |day| {
                if let Some(ex) = day
                    .body_part_mut(body_part)
                    .and_then(|bp| bp.exercise_mut(exercise))
                {
                    ex.sets.push(set);
                }
            },
        ))
    }

    async fn get_day(&self, id: &str) -> Result<Option<WorkoutDay>, AppError> {
        Ok(self.days.get(id).map(|day| day.value().clone()))
    }

    async fn list_days(&self) -> Result<Vec<WorkoutDay>, AppError> {
        let mut days: Vec<WorkoutDay> = self.days.iter().map(|d| d.value().clone()).collect();
        days.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(days)
    }

    async fn replace_day(&self, day: &WorkoutDay) -> Result<(), AppError> {
        self.days.insert(day.id.clone(), day.clone());
        Ok(())
    }

    async fn delete_day(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.days.remove(id).is_some())
    }

    async fn delete_all_days(&self) -> Result<usize, AppError> {
        let count = self.days.len();
        self.days.clear();
        Ok(count)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(username).map(|u| u.value().clone()))
    }

    async fn create_user(&self, user: &User) -> Result<bool, AppError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(true)
            }
        }
    }
}
