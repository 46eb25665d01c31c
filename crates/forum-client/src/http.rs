// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The HTTP client used to talk to the forum.

use std::time::Duration;

static USER_AGENT: &str = concat!("forumauth/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used to talk to the forum
///
/// Redirects are never followed, as the `oauth2` crate requires for the token
/// endpoint.
///
/// # Errors
///
/// Returns an error if the TLS backend could not be initialised
pub fn client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(30))
        .build()
}
