// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout-Tracker: a personal workout log
//!
//! This crate provides the backend API for recording workouts as one
//! document per date, nested by body part, exercise and set.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::DateLocks;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Per-date write locks shared by all requests
    pub date_locks: DateLocks,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            config,
            db,
            date_locks: DateLocks::default(),
        }
    }
}
