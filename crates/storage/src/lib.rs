// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Interactions with the storage backend
//!
//! This crate provides a set of traits that can be implemented to interact with
//! the storage backend. Those traits are called repositories and are grouped by
//! the type of data they manage. For now, the only data we manage are the links
//! between host accounts and forum users, through the
//! [`AccountLinkRepository`].
//!
//! Each of those repositories can be accessed via the [`RepositoryAccess`]
//! trait. This trait can be wrapped in a [`BoxRepository`] to allow using it
//! without caring about the underlying storage backend, and without carrying
//! around the generic type parameter. A [`BoxRepository`] is a transaction:
//! it has to be explicitly saved with [`RepositoryTransaction::save`],
//! otherwise its changes are rolled back.
//!
//! This crate also defines a [`Clock`] trait that can be used to abstract the
//! way the current time is retrieved. It has two implementation:
//! [`SystemClock`] that uses the system time and [`MockClock`] which is useful
//! for testing.
//!
//! [`MockClock`]: crate::clock::MockClock
//! [`AccountLinkRepository`]: crate::link::AccountLinkRepository
//!
//! # Defining a new repository
//!
//! To define a new repository, you have to:
//!   1. Define a new (async) repository trait, with the methods you need
//!   2. Write an implementation of this trait for each storage backend you want
//!      (currently only for `forumauth-storage-sqlite`)
//!   3. Make it accessible via the [`RepositoryAccess`] trait
//!
//! The repository trait definition should use an associated error type, and
//! be implemented for `Box<R>` and for the [`MapErr`] wrapper, so that
//! it can be reached through a [`BoxRepository`]:
//!
//! ```ignore
//! #[async_trait]
//! pub trait FakeDataRepository: Send + Sync {
//!     /// The error type returned by the repository
//!     type Error;
//!
//!     /// Lookup a [`FakeData`] by its ID
//!     async fn lookup(&mut self, id: &str) -> Result<Option<FakeData>, Self::Error>;
//! }
//!
//! #[async_trait]
//! impl<R, F, E> FakeDataRepository for MapErr<R, F>
//! where
//!     R: FakeDataRepository,
//!     F: FnMut(R::Error) -> E + Send + Sync,
//! {
//!     type Error = E;
//!
//!     async fn lookup(&mut self, id: &str) -> Result<Option<FakeData>, Self::Error> {
//!         self.inner.lookup(id).await.map_err(&mut self.mapper)
//!     }
//! }
//! ```

#![deny(clippy::future_not_send, missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod link;
pub(crate) mod repository;

pub use self::{
    clock::{BoxClock, Clock, SystemClock},
    repository::{
        BoxRepository, BoxRepositoryFactory, MapErr, Repository, RepositoryAccess,
        RepositoryError, RepositoryFactory, RepositoryTransaction,
    },
};
