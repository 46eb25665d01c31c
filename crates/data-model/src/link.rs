// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{LocalAccountId, RemoteAccountId};

/// A persisted one-to-one association between a host account and a forum user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLink {
    pub local_account_id: LocalAccountId,
    pub remote_account_id: RemoteAccountId,
    pub created_at: DateTime<Utc>,
}
