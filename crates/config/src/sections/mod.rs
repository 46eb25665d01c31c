// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod database;
mod forum;
mod secrets;

pub use self::{database::DatabaseConfig, forum::ForumConfig, secrets::SecretsConfig};
use crate::util::ConfigurationSection;

/// Application configuration root
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// Configuration of the forum used as the identity provider
    pub forum: ForumConfig,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Application secrets
    pub secrets: SecretsConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(
        &self,
        figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        self.forum.validate(figment)?;
        self.database.validate(figment)?;
        self.secrets.validate(figment)?;

        Ok(())
    }
}

impl RootConfig {
    /// Generate a new configuration with random secrets
    #[must_use]
    pub fn generate<R>(rng: R) -> Self
    where
        R: Rng + Send,
    {
        Self {
            forum: ForumConfig::generate(),
            database: DatabaseConfig::default(),
            secrets: SecretsConfig::generate(rng),
        }
    }

    /// Configuration used in tests
    #[must_use]
    pub fn test() -> Self {
        Self {
            forum: ForumConfig::test(),
            database: DatabaseConfig::default(),
            secrets: SecretsConfig::test(),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Env, Format, Serialized, Yaml},
    };
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn generated_config_is_valid() {
        Jail::expect_with(|_jail| {
            let rng = rand_chacha::ChaChaRng::seed_from_u64(42);
            let generated = RootConfig::generate(rng);

            let figment = Figment::from(Serialized::defaults(&generated));
            let config = RootConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.forum.client_id, generated.forum.client_id);
            assert_eq!(config.secrets.encryption, generated.secrets.encryption);
            assert_eq!(config.database, DatabaseConfig::default());

            Ok(())
        });
    }

    #[test]
    fn env_completes_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      client_id: abcdef
                      client_secret: s3cr3t
                    secrets:
                      encryption: 0000111122223333444455556666777788889999aaaabbbbccccddddeeeeffff
                ",
            )?;
            jail.set_env("FORUMAUTH_FORUM__AUTO_CREATE", "true");
            jail.set_env("FORUMAUTH_DATABASE__SHARED_DATABASE", "wikishared");

            let figment = Figment::new()
                .merge(Env::prefixed("FORUMAUTH_").split("__"))
                .admerge(Yaml::file("config.yaml"));
            let config = RootConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert!(config.forum.auto_create);
            assert_eq!(
                config.database.shared_database.as_deref(),
                Some("wikishared")
            );

            Ok(())
        });
    }

    #[test]
    fn missing_secrets_is_an_error() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      client_id: abcdef
                      client_secret: s3cr3t
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(RootConfig::extract(&figment).is_err());

            Ok(())
        });
    }
}
