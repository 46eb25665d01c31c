// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Repository to interact with the links between host accounts and forum users

use async_trait::async_trait;
use forumauth_data_model::{AccountLink, LocalAccountId, RemoteAccountId};

use crate::{Clock, MapErr};

/// How fresh a read needs to be
///
/// Any read that feeds a security decision (letting someone log in, or
/// deciding whether a link may be created) must use [`Consistency::Latest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consistency {
    /// Read the latest committed state
    Latest,

    /// A possibly stale read is acceptable
    #[default]
    Replica,
}

/// An [`AccountLinkRepository`] helps interacting with [`AccountLink`] with
/// the storage backend
///
/// There is at most one link per local account and at most one link per
/// remote account. Links are never updated in place: they are created, then
/// eventually removed.
#[async_trait]
pub trait AccountLinkRepository: Send + Sync {
    /// The error type returned by the repository
    type Error;

    /// Find the link associated with a remote account
    ///
    /// Returns `None` if the remote account is not linked
    ///
    /// # Parameters
    ///
    /// * `remote_account_id`: The ID of the forum user
    /// * `consistency`: How fresh the read needs to be
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn find_by_remote(
        &mut self,
        remote_account_id: &RemoteAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error>;

    /// Find the link associated with a local account
    ///
    /// Returns `None` if the local account is not linked
    ///
    /// # Parameters
    ///
    /// * `local_account_id`: The ID of the host account
    /// * `consistency`: How fresh the read needs to be
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn find_by_local(
        &mut self,
        local_account_id: &LocalAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error>;

    /// Link a local account to a remote account
    ///
    /// Returns the newly created link, or `None` if either account is
    /// already linked. The check is done by the storage backend, so that two
    /// concurrent calls for the same account can't both succeed.
    ///
    /// # Parameters
    ///
    /// * `clock`: The clock used to generate timestamps
    /// * `local_account_id`: The ID of the host account
    /// * `remote_account_id`: The ID of the forum user
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn add(
        &mut self,
        clock: &dyn Clock,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<AccountLink>, Self::Error>;

    /// Remove the link associated with a remote account
    ///
    /// Returns `true` if a link was removed. Removing a link which doesn't
    /// exist is not an error.
    ///
    /// # Parameters
    ///
    /// * `remote_account_id`: The ID of the forum user
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn remove(&mut self, remote_account_id: &RemoteAccountId) -> Result<bool, Self::Error>;

    /// Count the number of links
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the underlying repository fails
    async fn count(&mut self) -> Result<usize, Self::Error>;
}

#[async_trait]
impl<R> AccountLinkRepository for Box<R>
where
    R: AccountLinkRepository + ?Sized,
{
    type Error = R::Error;

    async fn find_by_remote(
        &mut self,
        remote_account_id: &RemoteAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        (**self).find_by_remote(remote_account_id, consistency).await
    }

    async fn find_by_local(
        &mut self,
        local_account_id: &LocalAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        (**self).find_by_local(local_account_id, consistency).await
    }

    async fn add(
        &mut self,
        clock: &dyn Clock,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<AccountLink>, Self::Error> {
        (**self)
            .add(clock, local_account_id, remote_account_id)
            .await
    }

    async fn remove(&mut self, remote_account_id: &RemoteAccountId) -> Result<bool, Self::Error> {
        (**self).remove(remote_account_id).await
    }

    async fn count(&mut self) -> Result<usize, Self::Error> {
        (**self).count().await
    }
}

#[async_trait]
impl<R, F, E> AccountLinkRepository for MapErr<R, F>
where
    R: AccountLinkRepository,
    F: FnMut(R::Error) -> E + Send + Sync,
{
    type Error = E;

    async fn find_by_remote(
        &mut self,
        remote_account_id: &RemoteAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        self.inner
            .find_by_remote(remote_account_id, consistency)
            .await
            .map_err(&mut self.mapper)
    }

    async fn find_by_local(
        &mut self,
        local_account_id: &LocalAccountId,
        consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        self.inner
            .find_by_local(local_account_id, consistency)
            .await
            .map_err(&mut self.mapper)
    }

    async fn add(
        &mut self,
        clock: &dyn Clock,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<AccountLink>, Self::Error> {
        self.inner
            .add(clock, local_account_id, remote_account_id)
            .await
            .map_err(&mut self.mapper)
    }

    async fn remove(&mut self, remote_account_id: &RemoteAccountId) -> Result<bool, Self::Error> {
        self.inner
            .remove(remote_account_id)
            .await
            .map_err(&mut self.mapper)
    }

    async fn count(&mut self) -> Result<usize, Self::Error> {
        self.inner.count().await.map_err(&mut self.mapper)
    }
}
