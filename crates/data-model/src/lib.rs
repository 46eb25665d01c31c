// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![allow(clippy::module_name_repetitions)]

//! Data types shared by the forum login provider crates

mod accounts;
mod link;
mod profile;

pub use self::{
    accounts::{InvalidAccountId, LocalAccount, LocalAccountId, RemoteAccountId},
    link::AccountLink,
    profile::RemoteProfile,
};
