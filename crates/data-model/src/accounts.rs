// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when parsing an empty account identifier
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("account identifiers must not be empty")]
pub struct InvalidAccountId;

macro_rules! account_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier
            ///
            /// # Errors
            ///
            /// Returns [`InvalidAccountId`] if the identifier is empty
            pub fn new(id: impl Into<String>) -> Result<Self, InvalidAccountId> {
                let id = id.into();
                if id.is_empty() {
                    return Err(InvalidAccountId);
                }

                Ok(Self(id))
            }

            /// Get the identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidAccountId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidAccountId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

account_id!(
    /// Opaque identifier of an account on the host
    LocalAccountId
);

account_id!(
    /// Opaque identifier of a user on the remote forum
    RemoteAccountId
);

/// An account on the host, as seen by the login provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalAccount {
    pub id: LocalAccountId,
    pub name: String,
    pub email: Option<String>,
}
