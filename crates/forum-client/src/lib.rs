// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A client for the OAuth2 identity provider of a [XenForo] forum running the
//! [bdApi] add-on.
//!
//! # Scope
//!
//! This crate only covers what is needed to log someone in with their forum
//! account:
//!
//! - building the authorization URL, with the `read` scope
//! - exchanging the authorization code for an access token
//! - fetching the profile of the user owning the access token
//! - fetching the public profile of any user by their ID
//!
//! The OAuth2 parts are handled by the [`oauth2`] crate. No request is ever
//! retried.
//!
//! [XenForo]: https://xenforo.com/
//! [bdApi]: https://github.com/xfrocks/bdApi

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod client;
pub mod endpoints;
pub mod error;
pub mod http;

use std::fmt;

use async_trait::async_trait;
use forumauth_data_model::{RemoteAccountId, RemoteProfile};
use url::Url;

pub use self::{client::ForumClient, error::ClientError};

/// Where to send the user to start an authorization, and the `state` the
/// forum will send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// The URL of the authorization endpoint, with all the parameters set
    pub url: Url,

    /// The random `state` parameter, to check against the one returned in the
    /// callback
    pub state: String,
}

/// An access token obtained from the forum
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    access_token: String,
}

impl AuthenticatedSession {
    /// Wrap an access token
    #[must_use]
    pub fn new(access_token: String) -> Self {
        Self { access_token }
    }

    /// Get the access token
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// Everything the login provider needs from the forum
#[async_trait]
pub trait RemoteIdentityFetcher: Send + Sync {
    /// Build the URL to which the user should be redirected to authorize the
    /// login, with the given callback URL
    fn authorization_url(&self, redirect_uri: &Url) -> AuthorizationRequest;

    /// Exchange an authorization code for an access token
    ///
    /// The `redirect_uri` must be the same as the one used to build the
    /// authorization URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the forum rejected the code, or couldn't be reached
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<AuthenticatedSession, ClientError>;

    /// Fetch the profile of the user owning the access token
    ///
    /// # Errors
    ///
    /// Returns an error if the request failed, or if the response doesn't
    /// describe a user
    async fn fetch_profile(
        &self,
        session: &AuthenticatedSession,
    ) -> Result<RemoteProfile, ClientError>;

    /// Fetch the public profile of a user
    ///
    /// Returns `None` if the forum doesn't know the user
    ///
    /// # Errors
    ///
    /// Returns an error if the request failed
    async fn fetch_public_profile(
        &self,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<RemoteProfile>, ClientError>;
}
