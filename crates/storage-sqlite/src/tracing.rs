// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use sqlx::Sqlite;
use tracing::Span;

/// The span field in which the SQL statement is recorded
const DB_QUERY_TEXT: &str = "db.query.text";

/// An extension trait for SQLite statements that records the SQL text as
/// `db.query.text` in the current span
///
/// The span must declare the field upfront, usually with
/// `#[tracing::instrument(fields(db.query.text))]`.
pub(crate) trait ExecuteExt<'q>: Sized {
    #[must_use]
    fn traced(self) -> Self;
}

impl<'q, T> ExecuteExt<'q> for T
where
    T: sqlx::Execute<'q, Sqlite>,
{
    fn traced(self) -> Self {
        Span::current().record(DB_QUERY_TEXT, self.sql());
        self
    }
}
