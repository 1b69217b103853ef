// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed document store for Itinera.
//!
//! Implements the `DocumentStore` contract from `itinera-core` on top of a
//! single SQLite database: JSON document bodies, `json_extract` filters,
//! in-process cosine ranking, and lazy TTL purging.

pub mod database;
pub mod migrations;
pub mod sqlite;
pub mod vector;

pub use database::Database;
pub use sqlite::SqliteDocumentStore;
