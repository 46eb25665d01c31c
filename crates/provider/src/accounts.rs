// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Access to the accounts of the host

use std::sync::Arc;

use async_trait::async_trait;
use forumauth_data_model::{LocalAccount, LocalAccountId};
use thiserror::Error;

/// An error returned by the host when accessing its accounts
#[derive(Debug, Error)]
#[error(transparent)]
pub struct HostAccountsError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl HostAccountsError {
    /// Wrap any error returned by the host
    pub fn from_error<E>(value: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(value),
        }
    }
}

/// The accounts of the host, as needed by the login provider
///
/// The provider never creates accounts itself: it only looks them up, and
/// fills in the email of the accounts created on its behalf.
#[async_trait]
pub trait HostAccounts: Send + Sync {
    /// Find an account by its ID
    ///
    /// # Errors
    ///
    /// Returns an error if the host failed to look the account up
    async fn find_by_id(
        &self,
        id: &LocalAccountId,
    ) -> Result<Option<LocalAccount>, HostAccountsError>;

    /// Find an account by its name
    ///
    /// # Errors
    ///
    /// Returns an error if the host failed to look the account up
    async fn find_by_name(&self, name: &str) -> Result<Option<LocalAccount>, HostAccountsError>;

    /// Set the email address of an account
    ///
    /// # Errors
    ///
    /// Returns an error if the host failed to save the address
    async fn set_email(&self, id: &LocalAccountId, email: &str) -> Result<(), HostAccountsError>;
}

/// A type-erased [`HostAccounts`]
pub type BoxHostAccounts = Arc<dyn HostAccounts>;
