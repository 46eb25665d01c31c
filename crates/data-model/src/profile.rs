// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RemoteAccountId;

/// A snapshot of a forum user, as returned by the forum API
///
/// It is fetched fresh for every authentication attempt. Only the
/// `remote_account_id` and, on account creation, the `email` end up being
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub remote_account_id: RemoteAccountId,
    pub display_name: Option<String>,
    pub email: Option<String>,

    /// Every other field returned by the forum
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RemoteProfile {
    /// Build a profile out of the `user` object returned by the forum API
    ///
    /// Returns `None` if the object has no usable `user_id`.
    #[must_use]
    pub fn from_user_info(mut user: Map<String, Value>) -> Option<Self> {
        let remote_account_id = match user.remove("user_id")? {
            Value::Number(number) => number.to_string(),
            Value::String(string) => string,
            _ => return None,
        };
        let remote_account_id = RemoteAccountId::new(remote_account_id).ok()?;

        let display_name = take_string(&mut user, "username");
        let email = take_string(&mut user, "user_email");

        Some(Self {
            remote_account_id,
            display_name,
            email,
            attributes: user,
        })
    }

    /// The display name followed by the remote ID in parentheses, or only the
    /// ID if the forum did not return a name
    #[must_use]
    pub fn full_name_with_id(&self) -> String {
        match &self.display_name {
            Some(name) => format!("{name} ({})", self.remote_account_id),
            None => self.remote_account_id.to_string(),
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(value)) if !value.is_empty() => Some(value),
        _ => None,
    }
}
