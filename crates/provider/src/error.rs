// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use forumauth_storage::RepositoryError;
use thiserror::Error;

use crate::accounts::HostAccountsError;

/// The reasons an authentication, link or unlink attempt can fail
///
/// Every failure is final for the current attempt: the user has to start over.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request set doesn't contain the state of an authorization started
    /// by this provider
    #[error("No authentication workflow in progress")]
    NoAuthenticationWorkflow,

    /// The user refused to grant access on the forum
    #[error("Access to the forum account was denied")]
    AuthenticationDenied,

    /// The forum returned an error, or could not be talked to
    #[error("Error while talking to the forum: {0}")]
    ProviderError(String),

    /// A local account with the forum user name exists, but is not linked to
    /// the forum user
    #[error("A local account named {0:?} already exists and is not linked to this forum user")]
    NameCollision(String),

    /// The forum user is linked to another local account
    #[error("This forum user is already linked to another account")]
    AlreadyLinkedElsewhere,

    /// The forum user is already linked to this local account
    #[error("This forum user is already linked to this account")]
    AlreadyLinkedSame,

    /// The forum user to unlink is not the one linked to the local account
    #[error("This forum user is not linked to this account")]
    NotLinked,

    /// The pending link token is expired, tampered or malformed
    #[error("The pending login is invalid or expired")]
    InvalidPendingLink,

    /// The link store failed, or refused to store a link
    #[error("Database error")]
    StorageError(#[source] Option<RepositoryError>),
}

impl AuthError {
    /// The key of the message to show to the user, in the host's message
    /// catalogue
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NoAuthenticationWorkflow => "forumauth-error-no-authentication-workflow",
            Self::AuthenticationDenied => "forumauth-access-denied",
            Self::ProviderError(_) => "forumauth-generic-error",
            Self::NameCollision(_) => "forumauth-local-exists",
            Self::AlreadyLinkedElsewhere => "forumauth-link-other",
            Self::AlreadyLinkedSame => "forumauth-link-same",
            Self::NotLinked => "forumauth-change-account-not-linked",
            Self::InvalidPendingLink => "forumauth-invalid-pending-link",
            Self::StorageError(_) => "forumauth-storage-error",
        }
    }

    /// The parameter of the message, if it has one
    #[must_use]
    pub fn message_param(&self) -> Option<&str> {
        match self {
            Self::ProviderError(detail) => Some(detail),
            Self::NameCollision(name) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn provider(error: impl std::fmt::Display) -> Self {
        Self::ProviderError(error.to_string())
    }
}

impl From<RepositoryError> for AuthError {
    fn from(error: RepositoryError) -> Self {
        Self::StorageError(Some(error))
    }
}

impl From<HostAccountsError> for AuthError {
    fn from(error: HostAccountsError) -> Self {
        Self::StorageError(Some(RepositoryError::from_error(error)))
    }
}
