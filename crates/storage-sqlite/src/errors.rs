// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use thiserror::Error;

/// Generic error when interacting with the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An error which came from the database itself
    #[error(transparent)]
    Driver {
        /// The underlying error from the database driver
        #[from]
        source: sqlx::Error,
    },

    /// An error which occured while converting the data from the database
    #[error(transparent)]
    Inconsistency(#[from] DatabaseInconsistencyError),

    /// An error which happened because the requested database operation is
    /// invalid
    #[error("Invalid database operation")]
    InvalidOperation {
        /// The source of the error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DatabaseError {
    pub(crate) fn to_invalid_operation<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::InvalidOperation {
            source: Some(Box::new(e)),
        }
    }

    /// Returns `true` if this error was caused by a uniqueness constraint
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Driver {
                source: sqlx::Error::Database(e),
            } => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// An error which occured while converting data from the database
#[derive(Debug, Error)]
#[error("Database inconsistency on {table}.{column} (row {row:?})")]
pub struct DatabaseInconsistencyError {
    table: &'static str,
    column: &'static str,
    row: Option<String>,

    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DatabaseInconsistencyError {
    /// Create a new [`DatabaseInconsistencyError`] for the given table and
    /// column
    #[must_use]
    pub(crate) const fn on(table: &'static str, column: &'static str) -> Self {
        Self {
            table,
            column,
            row: None,
            source: None,
        }
    }

    /// Attach the row identifier to the error
    #[must_use]
    pub(crate) fn row(mut self, row: impl Into<String>) -> Self {
        self.row = Some(row.into());
        self
    }

    /// Attach the source of the error
    #[must_use]
    pub(crate) fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }
}
