// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use url::Url;

use crate::{
    error::AuthError,
    requests::{RemoteProfileRequest, ServerAuthenticationRequest},
};

/// The outcome of a step of an authentication flow
#[derive(Debug)]
pub enum AuthenticationResponse {
    /// The step succeeded
    Pass {
        /// The name of the local account the user is logged in as, if known
        username: Option<String>,

        /// A forum profile to link to the account, once it is known
        link_request: Option<RemoteProfileRequest>,

        /// A forum profile from which to create a new account
        create_request: Option<RemoteProfileRequest>,
    },

    /// The user must be sent to the forum
    Redirect {
        /// Where to send the user
        url: Url,

        /// The request to hand back once the user comes back
        request: ServerAuthenticationRequest,
    },

    /// The step failed
    Fail(AuthError),

    /// The request is not for this provider
    Abstain,
}

impl AuthenticationResponse {
    pub(crate) fn pass(username: Option<String>) -> Self {
        Self::Pass {
            username,
            link_request: None,
            create_request: None,
        }
    }

    pub(crate) fn pass_with_link(
        username: Option<String>,
        link_request: RemoteProfileRequest,
    ) -> Self {
        Self::Pass {
            username,
            link_request: Some(link_request),
            create_request: None,
        }
    }
}

impl From<AuthError> for AuthenticationResponse {
    fn from(error: AuthError) -> Self {
        Self::Fail(error)
    }
}

impl From<Result<Self, AuthError>> for AuthenticationResponse {
    fn from(result: Result<Self, AuthError>) -> Self {
        result.unwrap_or_else(Self::Fail)
    }
}

/// Whether the provider accepts a change of credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChangeStatus {
    /// The change is accepted
    Good,

    /// The change is not about this provider
    Ignored,
}

/// How to present linked credentials to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsDescription {
    /// The message key of the provider name
    pub provider: &'static str,

    /// The forum account
    pub account: String,
}
