// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use forumauth_config::{DatabaseConfig, ForumConfig};
use forumauth_forum_client::{ForumClient, RemoteIdentityFetcher};
use sqlx::{
    ConnectOptions, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::log::LevelFilter;

fn database_connect_options_from_config(
    config: &DatabaseConfig,
) -> Result<SqliteConnectOptions, anyhow::Error> {
    let options = SqliteConnectOptions::from_str(&config.uri)
        .context("could not parse database URI")?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.connect_timeout)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(100));

    Ok(options)
}

/// Create a database connection pool from the configuration
#[tracing::instrument(name = "db.connect", skip_all)]
pub async fn database_pool_from_config(
    config: &DatabaseConfig,
) -> Result<SqlitePool, anyhow::Error> {
    let options = database_connect_options_from_config(config)?;
    SqlitePoolOptions::new()
        .max_connections(config.max_connections.into())
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await
        .context("could not connect to the database")
}

/// Create a single database connection from the configuration
#[tracing::instrument(name = "db.connect", skip_all)]
pub async fn database_connection_from_config(
    config: &DatabaseConfig,
) -> Result<SqliteConnection, anyhow::Error> {
    database_connect_options_from_config(config)?
        .connect()
        .await
        .context("could not connect to the database")
}

/// Create the client talking to the forum API
pub fn forum_client_from_config(
    config: &ForumConfig,
) -> Result<Arc<dyn RemoteIdentityFetcher>, anyhow::Error> {
    let http_client =
        forumauth_forum_client::http::client().context("could not build the HTTP client")?;

    let client = ForumClient::new(
        http_client,
        &config.base_url,
        config.client_id.clone(),
        config.client_secret.clone(),
    )
    .context("invalid forum configuration")?;

    Ok(Arc::new(client))
}
