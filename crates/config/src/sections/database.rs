// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{num::NonZeroU32, time::Duration};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::ConfigurationSection;

fn default_connection_string() -> String {
    "sqlite://forumauth.db?mode=rwc".to_owned()
}

fn default_database_name() -> String {
    "forumauth".to_owned()
}

fn default_max_connections() -> NonZeroU32 {
    NonZeroU32::new(10).unwrap()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

#[allow(clippy::unnecessary_wraps)]
fn default_idle_timeout() -> Option<Duration> {
    Some(Duration::from_secs(10 * 60))
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_connection_string(),
            max_connections: default_max_connections(),
            min_connections: Default::default(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            database_name: default_database_name(),
            shared_database: None,
        }
    }
}

/// Database connection configuration
#[serde_as]
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection URI of the SQLite database
    ///
    /// This must use the `sqlite:` scheme. Add `?mode=rwc` to create the
    /// database file if it doesn't exist.
    #[serde(default = "default_connection_string")]
    #[schemars(example = "default_connection_string")]
    pub uri: String,

    /// Set the maximum number of connections the pool should maintain
    #[schemars(with = "u32", range(min = 1))]
    #[serde(default = "default_max_connections")]
    pub max_connections: NonZeroU32,

    /// Set the minimum number of connections the pool should maintain
    #[serde(default)]
    pub min_connections: u32,

    /// Set the amount of time to attempt connecting to the database
    #[schemars(with = "u64")]
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub connect_timeout: Duration,

    /// Set a maximum idle duration for individual connections
    #[schemars(with = "Option<u64>")]
    #[serde(
        default = "default_idle_timeout",
        skip_serializing_if = "Option::is_none"
    )]
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub idle_timeout: Option<Duration>,

    /// Name of the database of this deployment
    #[serde(default = "default_database_name")]
    pub database_name: String,

    /// Name of the database shared between several deployments, if any
    ///
    /// The account links table is not managed by this deployment when the
    /// shared database is a different one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_database: Option<String>,
}

impl ConfigurationSection for DatabaseConfig {
    const PATH: Option<&'static str> = Some("database");

    fn validate(
        &self,
        _figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        if !self.uri.starts_with("sqlite:") {
            return Err("database.uri must be a sqlite: URI".into());
        }

        if self.min_connections > self.max_connections.get() {
            return Err(
                "database.min_connections must not be greater than database.max_connections"
                    .into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;
    use crate::ConfigurationSectionExt;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      uri: sqlite:///var/lib/forumauth/links.db
                      max_connections: 4
                      shared_database: wikishared
                ",
            )?;

            let config = Figment::new()
                .merge(Yaml::file("config.yaml"))
                .extract_inner::<DatabaseConfig>("database")?;

            assert_eq!(config.uri, "sqlite:///var/lib/forumauth/links.db");
            assert_eq!(config.max_connections.get(), 4);
            assert_eq!(config.min_connections, 0);
            assert_eq!(config.connect_timeout, Duration::from_secs(30));
            assert_eq!(config.idle_timeout, Some(Duration::from_secs(600)));
            assert_eq!(config.shared_database.as_deref(), Some("wikishared"));
            assert_eq!(config.database_name, "forumauth");

            Ok(())
        });
    }

    #[test]
    fn missing_section_uses_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "forum: {}")?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config =
                DatabaseConfig::extract_or_default(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config, DatabaseConfig::default());
            assert_eq!(config.uri, "sqlite://forumauth.db?mode=rwc");
            assert_eq!(config.shared_database, None);

            Ok(())
        });
    }

    #[test]
    fn reject_non_sqlite_uri() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    database:
                      uri: postgresql://localhost/forumauth
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(DatabaseConfig::extract_or_default(&figment).is_err());

            Ok(())
        });
    }
}
