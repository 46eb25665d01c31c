// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! The error types used in this crate.

use oauth2::{HttpClientError, RequestTokenError, basic::BasicErrorResponse};
use thiserror::Error;

/// The error returned by the `oauth2` crate when exchanging a code
pub type TokenExchangeError =
    RequestTokenError<HttpClientError<reqwest::Error>, BasicErrorResponse>;

/// All possible errors when talking to the forum.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The forum base URL can't be used to build the API endpoints.
    #[error("Invalid forum URL: {0}")]
    Url(#[from] url::ParseError),

    /// The forum base URL can't hold a path.
    #[error("The forum URL {0} can't be a base URL")]
    CannotBeABase(url::Url),

    /// An error occurred while sending the request or reading the response.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The forum rejected the authorization code.
    #[error("Token exchange failed: {0}")]
    TokenExchange(#[from] TokenExchangeError),

    /// The forum response didn't describe a user.
    #[error("The forum response did not contain a user")]
    MissingUser,
}
