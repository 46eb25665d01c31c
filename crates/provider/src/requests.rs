// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Requests exchanged with the host during the authentication flows.
//!
//! The host keeps these between calls: nothing is remembered by the provider
//! itself.

use forumauth_data_model::RemoteAccountId;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::pending::PendingLinkToken;

/// The name of the button shown by the host to log in with the forum
pub const BUTTON_REQUEST_NAME: &str = "forumauth";

/// The actions for which the host asks which requests the provider needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthAction {
    /// Log in
    Login,

    /// Create a new account
    Create,

    /// Link an existing account
    Link,

    /// Change the credentials of an account
    Change,

    /// Remove credentials from an account
    Remove,

    /// Unlink an account
    Unlink,
}

/// A request, as handed over by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthenticationRequest {
    /// A button the user clicked
    Button(ButtonRequest),

    /// An authorization in progress on the forum
    Server(ServerAuthenticationRequest),

    /// A forum profile waiting to be linked to a local account
    RemoteProfile(RemoteProfileRequest),

    /// The removal of the link between an account and a forum user
    Remove(RemoveRequest),
}

impl AuthenticationRequest {
    /// Find the button with the given name
    #[must_use]
    pub fn find_button<'a>(requests: &'a [Self], name: &str) -> Option<&'a ButtonRequest> {
        requests.iter().find_map(|request| match request {
            Self::Button(button) if button.name == name => Some(button),
            _ => None,
        })
    }

    /// Find the first authorization in progress
    #[must_use]
    pub fn find_server(requests: &[Self]) -> Option<&ServerAuthenticationRequest> {
        requests.iter().find_map(|request| match request {
            Self::Server(server) => Some(server),
            _ => None,
        })
    }

    /// Find the first forum profile waiting to be linked
    #[must_use]
    pub fn find_remote_profile(requests: &[Self]) -> Option<&RemoteProfileRequest> {
        requests.iter().find_map(|request| match request {
            Self::RemoteProfile(profile) => Some(profile),
            _ => None,
        })
    }
}

/// A button shown on the host forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonRequest {
    /// The name of the button
    pub name: String,

    /// The message key of the button label
    pub label: String,

    /// The message key of the button help
    pub help: String,

    /// Where the host wants the user to come back to, filled by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_to_url: Option<Url>,
}

impl ButtonRequest {
    pub(crate) fn forum(label: &str, help: &str) -> Self {
        Self {
            name: BUTTON_REQUEST_NAME.to_owned(),
            label: label.to_owned(),
            help: help.to_owned(),
            return_to_url: None,
        }
    }
}

/// The state of an authorization started on the forum, and what the forum
/// sent back once the user was redirected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAuthenticationRequest {
    /// The callback URL given to the forum
    pub return_to_url: Url,

    /// The `state` parameter sent to the forum
    pub expected_state: String,

    /// The `state` parameter sent back by the forum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// The authorization code sent back by the forum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// The error code sent back by the forum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerAuthenticationRequest {
    pub(crate) fn new(return_to_url: Url, expected_state: String) -> Self {
        Self {
            return_to_url,
            expected_state,
            state: None,
            code: None,
            error: None,
        }
    }

    /// Fill the request from the parameters of the callback
    ///
    /// An error takes precedence over an authorization code. Returns `false`
    /// if the parameters carry neither.
    pub fn load_from_submission<'a, I>(&mut self, params: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut code = None;
        let mut error = None;

        for (key, value) in params {
            match key {
                "code" => code = Some(value.to_owned()),
                "error" => error = Some(value.to_owned()),
                "state" => self.state = Some(value.to_owned()),
                _ => {}
            }
        }

        if error.is_some() {
            self.code = None;
            self.error = error;
            true
        } else if code.is_some() {
            self.code = code;
            self.error = None;
            true
        } else {
            false
        }
    }
}

/// A forum profile waiting for a local account, sealed in a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProfileRequest {
    /// The sealed profile
    pub token: PendingLinkToken,
}

/// The removal of the link between a local account and a forum user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    /// The name of the local account
    pub username: String,

    /// The forum user to unlink
    pub remote_account_id: RemoteAccountId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ServerAuthenticationRequest {
        ServerAuthenticationRequest::new(
            Url::parse("https://wiki.example.com/return").unwrap(),
            "expected".to_owned(),
        )
    }

    #[test]
    fn error_wins_over_code() {
        let mut request = request();
        assert!(request.load_from_submission([
            ("error", "access_denied"),
            ("code", "abcd"),
            ("state", "expected"),
        ]));

        assert_eq!(request.code, None);
        assert_eq!(request.error.as_deref(), Some("access_denied"));
        assert_eq!(request.state.as_deref(), Some("expected"));
    }

    #[test]
    fn error_only() {
        let mut request = request();
        assert!(request.load_from_submission([("error", "access_denied")]));

        assert_eq!(request.code, None);
        assert_eq!(request.error.as_deref(), Some("access_denied"));
    }

    #[test]
    fn nothing_to_load() {
        let mut request = request();
        assert!(!request.load_from_submission([("title", "Special:UserLogin")]));
        assert_eq!(request, self::request());
    }

    #[test]
    fn find_requests() {
        let requests = vec![
            AuthenticationRequest::Button(ButtonRequest {
                name: "other".to_owned(),
                label: "other".to_owned(),
                help: "other-help".to_owned(),
                return_to_url: None,
            }),
            AuthenticationRequest::Button(ButtonRequest::forum(
                "forumauth",
                "forumauth-loginbutton-help",
            )),
            AuthenticationRequest::Server(request()),
        ];

        let button = AuthenticationRequest::find_button(&requests, BUTTON_REQUEST_NAME).unwrap();
        assert_eq!(button.help, "forumauth-loginbutton-help");
        assert!(AuthenticationRequest::find_server(&requests).is_some());
        assert!(AuthenticationRequest::find_remote_profile(&requests).is_none());
    }
}
