// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! An implementation of the storage traits for a SQLite database
//!
//! This backend uses [`sqlx`] to interact with the database. Queries are
//! checked at runtime, and the schema is managed by the embedded migrations in
//! the `migrations` directory, exposed as [`MIGRATOR`].
//!
//! Each [`SqliteRepository`] wraps a transaction. The uniqueness of each side
//! of a link is enforced by `UNIQUE` constraints on the
//! `forum_account_links` table: an insert which would break them is reported
//! as `Ok(None)` by [`AccountLinkRepository::add`], and never as an error.
//!
//! [`AccountLinkRepository::add`]: forumauth_storage::link::AccountLinkRepository::add

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use sqlx::migrate::Migrator;

pub mod link;

pub(crate) mod errors;
pub(crate) mod repository;
pub(crate) mod tracing;

pub use self::{
    errors::{DatabaseError, DatabaseInconsistencyError},
    repository::{SqliteRepository, SqliteRepositoryFactory},
};

/// Embedded migrations, allowing them to run on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();
