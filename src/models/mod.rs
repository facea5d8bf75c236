// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod user;
pub mod workout;

pub use user::User;
pub use workout::{BodyPartEntry, ExerciseEntry, SetEntry, WorkoutDay, WorkoutEntry};
