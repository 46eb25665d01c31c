// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Routes of the bdApi add-on.
//!
//! bdApi doesn't use paths for its routes: everything goes through the
//! forum's `index.php`, with the route as the first element of the query
//! string, e.g. `https://forum.example.com/index.php?users/me`.

use forumauth_data_model::RemoteAccountId;
use url::Url;

use crate::error::ClientError;

/// The API endpoints of a forum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    index: Url,
}

impl Endpoints {
    /// Compute the endpoints from the forum base URL
    ///
    /// The base URL is the URL under which the forum's `index.php` lives. A
    /// missing trailing slash is added.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL can't hold a path
    pub fn new(base_url: &Url) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::CannotBeABase(base_url.clone()));
        }

        let mut base = base_url.clone();
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let index = base.join("index.php")?;
        Ok(Self { index })
    }

    fn route(&self, route: &str) -> Url {
        let mut url = self.index.clone();
        url.set_query(Some(route));
        url
    }

    /// The OAuth2 authorization endpoint
    #[must_use]
    pub fn authorize(&self) -> Url {
        self.route("oauth/authorize")
    }

    /// The OAuth2 token endpoint
    #[must_use]
    pub fn token(&self) -> Url {
        self.route("oauth/token")
    }

    /// The endpoint describing the user owning the access token
    #[must_use]
    pub fn me(&self, access_token: &str) -> Url {
        let mut url = self.route("users/me");
        url.query_pairs_mut()
            .append_pair("oauth_token", access_token);
        url
    }

    /// The endpoint describing a user by its ID
    #[must_use]
    pub fn user(&self, remote_account_id: &RemoteAccountId) -> Url {
        self.route(&format!("users/{remote_account_id}"))
    }
}
