// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A login provider for a wiki host, logging users in with their account on
//! a forum.
//!
//! The host drives the flows: for each of login, account link and account
//! creation, it calls a `begin_*` method, which usually redirects the user to
//! the forum, and then the matching `continue_*` method once the user is
//! back. Each step returns an [`AuthenticationResponse`].
//!
//! Links between local accounts and forum users are stored through the
//! [`forumauth_storage`] repositories. When the user still needs a local
//! account, their forum profile is sealed in a [`PendingLinkToken`] which the
//! host hands back once the account exists.
//!
//! The host events this provider reacts to are listed in the [`hooks`]
//! module.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod accounts;
mod error;
pub mod hooks;
pub mod pending;
mod provider;
pub mod requests;
mod response;

pub use self::{
    accounts::{BoxHostAccounts, HostAccounts, HostAccountsError},
    error::AuthError,
    pending::{PendingLinkSealer, PendingLinkToken},
    provider::{ForumAuthProvider, ProviderSettings},
    requests::{AuthAction, AuthenticationRequest},
    response::{AuthenticationResponse, CredentialsDescription, DataChangeStatus},
};
