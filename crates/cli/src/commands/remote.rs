// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use figment::Figment;
use forumauth_config::{ConfigurationSection, ForumConfig};
use forumauth_data_model::RemoteAccountId;
use tracing::{info, info_span, warn};
use url::Url;

use crate::util::forum_client_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Fetch the public profile of a forum user
    Show {
        /// The ID of the forum user
        id: RemoteAccountId,
    },

    /// Build the forum URL a user would be sent to when logging in
    AuthorizeUrl {
        /// Where the forum sends the user back
        ///
        /// Defaults to the configured redirect URI
        return_to: Option<Url>,
    },
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        let config = ForumConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
        let client = forum_client_from_config(&config)?;

        match self.subcommand {
            SC::Show { id } => {
                let _span = info_span!("cli.remote.show", remote_account.id = %id).entered();

                let Some(profile) = client.fetch_public_profile(&id).await? else {
                    warn!("The forum doesn't know this user");
                    return Ok(ExitCode::FAILURE);
                };

                info!(
                    name = %profile.full_name_with_id(),
                    email = profile.email.as_deref(),
                    "Found forum user"
                );
            }

            SC::AuthorizeUrl { return_to } => {
                let _span = info_span!("cli.remote.authorize_url").entered();

                let Some(return_to) = return_to.or(config.redirect_uri) else {
                    anyhow::bail!("no return URL given and no redirect_uri configured");
                };

                let request = client.authorization_url(&return_to);
                info!(url = %request.url, state = %request.state, "Built authorization URL");
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
