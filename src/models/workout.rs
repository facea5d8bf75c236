// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout log documents.
//!
//! A [`WorkoutDay`] is one document per date. Everything below it is nested
//! physically inside that document:
//!
//! ```text
//! WorkoutDay { date }
//!   └─ BodyPartEntry { body_part }
//!        └─ ExerciseEntry { name }
//!             └─ SetEntry { reps, weight }
//! ```

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One logged day, stored in the `workouts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutDay {
    /// Document ID (UUID v4)
    pub id: String,
    /// Date string exactly as submitted; no normalization is applied
    pub date: String,
    /// Body parts trained that day, in first-logged order
    #[serde(default)]
    pub workouts: Vec<BodyPartEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BodyPartEntry {
    pub body_part: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ExerciseEntry {
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

/// A single set. Values are opaque strings and are never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SetEntry {
    pub reps: String,
    pub weight: String,
}

/// A submitted log entry (create and edit payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutEntry {
    pub date: String,
    pub body_part: String,
    pub exercise: String,
    pub reps: String,
    pub weight: String,
}

impl SetEntry {
    pub fn new(reps: impl Into<String>, weight: impl Into<String>) -> Self {
        Self {
            reps: reps.into(),
            weight: weight.into(),
        }
    }

    pub fn from_entry(entry: &WorkoutEntry) -> Self {
        Self::new(&entry.reps, &entry.weight)
    }
}

impl ExerciseEntry {
    /// New exercise holding a single set.
    pub fn new(name: impl Into<String>, set: SetEntry) -> Self {
        Self {
            name: name.into(),
            sets: vec![set],
        }
    }

    pub fn from_entry(entry: &WorkoutEntry) -> Self {
        Self::new(&entry.exercise, SetEntry::from_entry(entry))
    }
}

impl BodyPartEntry {
    /// New body part holding a single exercise.
    pub fn new(body_part: impl Into<String>, exercise: ExerciseEntry) -> Self {
        Self {
            body_part: body_part.into(),
            exercises: vec![exercise],
        }
    }

    pub fn from_entry(entry: &WorkoutEntry) -> Self {
        Self::new(&entry.body_part, ExerciseEntry::from_entry(entry))
    }

    pub fn exercise(&self, name: &str) -> Option<&ExerciseEntry> {
        self.exercises.iter().find(|e| e.name == name)
    }

    pub fn exercise_mut(&mut self, name: &str) -> Option<&mut ExerciseEntry> {
        self.exercises.iter_mut().find(|e| e.name == name)
    }
}

impl WorkoutDay {
    /// New day document with a freshly generated ID.
    pub fn new(date: impl Into<String>, body_part: BodyPartEntry) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.into(),
            workouts: vec![body_part],
        }
    }

    /// Build the full single-branch document for an entry.
    pub fn from_entry(entry: &WorkoutEntry) -> Self {
        Self::new(&entry.date, BodyPartEntry::from_entry(entry))
    }

    pub fn body_part(&self, body_part: &str) -> Option<&BodyPartEntry> {
        self.workouts.iter().find(|w| w.body_part == body_part)
    }

    pub fn body_part_mut(&mut self, body_part: &str) -> Option<&mut BodyPartEntry> {
        self.workouts.iter_mut().find(|w| w.body_part == body_part)
    }

    pub fn has_body_part(&self, body_part: &str) -> bool {
        self.body_part(body_part).is_some()
    }

    pub fn has_exercise(&self, body_part: &str, exercise: &str) -> bool {
        self.body_part(body_part)
            .and_then(|bp| bp.exercise(exercise))
            .is_some()
    }

    /// Total number of sets across all body parts and exercises.
    pub fn set_count(&self) -> usize {
        self.workouts
            .iter()
            .flat_map(|bp| bp.exercises.iter())
            .map(|e| e.sets.len())
            .sum()
    }

    /// Overwrite the date and the first element of every nesting level.
    ///
    /// Always addresses `workouts[0].exercises[0].sets[0]`, no matter which
    /// element the caller had in mind. A level that is empty gets its first
    /// element created from `entry`.
    pub fn apply_positional_edit(&mut self, entry: &WorkoutEntry) {
        self.date = entry.date.clone();

        if self.workouts.is_empty() {
            self.workouts.push(BodyPartEntry::from_entry(entry));
            return;
        }
        let body_part = &mut self.workouts[0];
        body_part.body_part = entry.body_part.clone();

        if body_part.exercises.is_empty() {
            body_part.exercises.push(ExerciseEntry::from_entry(entry));
            return;
        }
        let exercise = &mut body_part.exercises[0];
        exercise.name = entry.exercise.clone();

        if exercise.sets.is_empty() {
            exercise.sets.push(SetEntry::from_entry(entry));
            return;
        }
        let set = &mut exercise.sets[0];
        set.reps = entry.reps.clone();
        set.weight = entry.weight.clone();
    }
}
