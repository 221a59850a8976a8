// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Parley turn pipeline.
//!
//! Holds the two tables the pipeline shares across processes: the
//! per-conversation lock table and the append-only rate-limit event log.
//! Access goes through a single-writer `tokio-rusqlite` connection with
//! embedded refinery migrations.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
