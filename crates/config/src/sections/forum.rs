// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use chrono::Duration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use url::Url;

use crate::ConfigurationSection;

fn default_base_url() -> Url {
    Url::parse("https://forum.example.com/").unwrap()
}

fn default_pending_link_ttl() -> Duration {
    Duration::microseconds(15 * 60 * 1000 * 1000)
}

fn is_default_pending_link_ttl(value: &Duration) -> bool {
    *value == default_pending_link_ttl()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_default_false(value: &bool) -> bool {
    !*value
}

fn is_http_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Configuration of the forum used as the identity provider
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForumConfig {
    /// Base URL of the forum, under which its `index.php` is served
    #[schemars(example = "default_base_url")]
    pub base_url: Url,

    /// The client ID of the API client registered on the forum
    pub client_id: String,

    /// The client secret of the API client registered on the forum
    pub client_secret: String,

    /// The URL to which the forum should redirect after the authorization.
    ///
    /// If not set, the return URL supplied by the host for each request is
    /// used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<Url>,

    /// Whether to create a local account on the first login of a forum user
    /// with no linked account. Defaults to `false`.
    #[serde(default, skip_serializing_if = "is_default_false")]
    pub auto_create: bool,

    /// The icon displayed on the login button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_icon: Option<String>,

    /// How long a login which still needs a local account stays valid, in
    /// seconds. Defaults to 15 minutes.
    #[schemars(with = "u64", range(min = 60, max = 86400))]
    #[serde(
        default = "default_pending_link_ttl",
        skip_serializing_if = "is_default_pending_link_ttl"
    )]
    #[serde_as(as = "serde_with::DurationSeconds<i64>")]
    pub pending_link_ttl: Duration,
}

impl ConfigurationSection for ForumConfig {
    const PATH: Option<&'static str> = Some("forum");

    fn validate(
        &self,
        _figment: &figment::Figment,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        if !is_http_url(&self.base_url) {
            return Err(format!(
                "forum.base_url must be an http or https URL, got {}",
                self.base_url
            )
            .into());
        }

        if self.base_url.cannot_be_a_base() {
            return Err("forum.base_url can't be used as a base URL".into());
        }

        if let Some(redirect_uri) = &self.redirect_uri {
            if !is_http_url(redirect_uri) {
                return Err(format!(
                    "forum.redirect_uri must be an http or https URL, got {redirect_uri}"
                )
                .into());
            }
        }

        if self.client_id.is_empty() {
            return Err("forum.client_id must not be empty".into());
        }

        if self.pending_link_ttl <= Duration::zero() {
            return Err("forum.pending_link_ttl must be positive".into());
        }

        Ok(())
    }
}

impl ForumConfig {
    pub(crate) fn generate() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: "forumauth".to_owned(),
            client_secret: "CHANGE-ME".to_owned(),
            redirect_uri: None,
            auto_create: false,
            button_icon: None,
            pending_link_ttl: default_pending_link_ttl(),
        }
    }

    pub(crate) fn test() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: "client".to_owned(),
            client_secret: "secret".to_owned(),
            redirect_uri: None,
            auto_create: false,
            button_icon: None,
            pending_link_ttl: default_pending_link_ttl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        Figment, Jail,
        providers::{Format, Yaml},
    };

    use super::*;

    #[test]
    fn load_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      client_id: abcdef
                      client_secret: s3cr3t
                      auto_create: true
                      button_icon: /images/forum.png
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = ForumConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert_eq!(config.base_url.as_str(), "https://community.example.com/");
            assert_eq!(config.client_id, "abcdef");
            assert_eq!(config.client_secret, "s3cr3t");
            assert_eq!(config.redirect_uri, None);
            assert!(config.auto_create);
            assert_eq!(config.button_icon.as_deref(), Some("/images/forum.png"));
            assert_eq!(config.pending_link_ttl, Duration::minutes(15));

            Ok(())
        });
    }

    #[test]
    fn load_config_with_ttl() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      redirect_uri: https://wiki.example.com/Special:ForumAuthReturn
                      client_id: abcdef
                      client_secret: s3cr3t
                      pending_link_ttl: 300
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            let config = ForumConfig::extract(&figment).map_err(|e| e.to_string())?;

            assert!(!config.auto_create);
            assert_eq!(config.pending_link_ttl, Duration::minutes(5));
            assert_eq!(
                config.redirect_uri.unwrap().as_str(),
                "https://wiki.example.com/Special:ForumAuthReturn"
            );

            Ok(())
        });
    }

    #[test]
    fn reject_invalid_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: ftp://community.example.com/
                      client_id: abcdef
                      client_secret: s3cr3t
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(ForumConfig::extract(&figment).is_err());

            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      client_id: ''
                      client_secret: s3cr3t
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(ForumConfig::extract(&figment).is_err());

            jail.create_file(
                "config.yaml",
                r"
                    forum:
                      base_url: https://community.example.com/
                      client_id: abcdef
                      client_secret: s3cr3t
                      pending_link_ttl: 0
                ",
            )?;

            let figment = Figment::new().merge(Yaml::file("config.yaml"));
            assert!(ForumConfig::extract(&figment).is_err());

            Ok(())
        });
    }
}
