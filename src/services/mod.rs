// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod git;
pub mod password;
pub mod upsert;

pub use upsert::{DateLocks, UpsertOutcome, WorkoutLogUpserter};
