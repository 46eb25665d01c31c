// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Tokens carrying a forum profile between the moment the user logs in on
//! the forum and the moment the host creates the matching local account.
//!
//! A token is the JSON-serialized profile and expiry date, encrypted with
//! ChaCha20-Poly1305 under a random nonce, and encoded as unpadded URL-safe
//! base64. It is self-contained: the two calls don't need to share any
//! memory.

use std::sync::Arc;

use aead::Aead;
use base64ct::{Base64UrlUnpadded, Encoding};
use chacha20poly1305::{ChaCha20Poly1305, KeyInit};
use chrono::{DateTime, Duration, Utc};
use forumauth_data_model::RemoteProfile;
use forumauth_storage::Clock;
use generic_array::GenericArray;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NONCE_LENGTH: usize = 12;

/// A sealed forum profile, waiting for a local account to be linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingLinkToken(String);

impl PendingLinkToken {
    /// The encoded token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PendingLinkToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An error while sealing or unsealing a [`PendingLinkToken`]
#[derive(Debug, Error)]
pub enum PendingLinkError {
    /// The token is not valid base64, or too short
    #[error("Malformed pending link token")]
    Malformed,

    /// The token was sealed with another key, or was tampered with
    #[error("Could not encrypt or decrypt the pending link token")]
    Crypto(#[from] aead::Error),

    /// The decrypted payload is not a pending link
    #[error("Invalid pending link payload")]
    Payload(#[from] serde_json::Error),

    /// The token is too old
    #[error("The pending link expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
}

impl From<base64ct::Error> for PendingLinkError {
    fn from(_: base64ct::Error) -> Self {
        Self::Malformed
    }
}

#[derive(Serialize, Deserialize)]
struct Payload {
    profile: RemoteProfile,
    expires_at: DateTime<Utc>,
}

/// Seals and unseals [`PendingLinkToken`]s
#[derive(Clone)]
pub struct PendingLinkSealer {
    aead: Arc<ChaCha20Poly1305>,
    ttl: Duration,
}

impl PendingLinkSealer {
    /// Create a sealer out of an encryption key, for tokens valid for `ttl`
    #[must_use]
    pub fn new(key: &[u8; 32], ttl: Duration) -> Self {
        let key = GenericArray::from_slice(key);
        let aead = Arc::new(ChaCha20Poly1305::new(key));
        Self { aead, ttl }
    }

    /// How long the tokens stay valid
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Seal a profile into a token
    ///
    /// # Errors
    ///
    /// Returns an error if the profile could not be serialized or encrypted
    pub fn seal(
        &self,
        clock: &dyn Clock,
        profile: &RemoteProfile,
    ) -> Result<PendingLinkToken, PendingLinkError> {
        let payload = Payload {
            profile: profile.clone(),
            expires_at: clock.now() + self.ttl,
        };
        let payload = serde_json::to_vec(&payload)?;

        let nonce: [u8; NONCE_LENGTH] = rand::random();
        let encrypted = self
            .aead
            .encrypt(GenericArray::from_slice(&nonce), payload.as_slice())?;

        let token = [&nonce[..], &encrypted].concat();
        Ok(PendingLinkToken(Base64UrlUnpadded::encode_string(&token)))
    }

    /// Get back the profile sealed in a token
    ///
    /// # Errors
    ///
    /// Returns an error if the token was not sealed with the same key, was
    /// tampered with, or is expired
    pub fn unseal(
        &self,
        clock: &dyn Clock,
        token: &PendingLinkToken,
    ) -> Result<RemoteProfile, PendingLinkError> {
        let token = Base64UrlUnpadded::decode_vec(token.as_str())?;
        if token.len() <= NONCE_LENGTH {
            return Err(PendingLinkError::Malformed);
        }

        let (nonce, encrypted) = token.split_at(NONCE_LENGTH);
        let payload = self
            .aead
            .decrypt(GenericArray::from_slice(nonce), encrypted)?;
        let payload: Payload = serde_json::from_slice(&payload)?;

        if payload.expires_at <= clock.now() {
            return Err(PendingLinkError::Expired {
                expired_at: payload.expires_at,
            });
        }

        Ok(payload.profile)
    }
}
