// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use figment::Figment;
use forumauth_config::{ConfigurationSectionExt, DatabaseConfig};
use forumauth_data_model::{AccountLink, LocalAccountId, RemoteAccountId};
use forumauth_storage::{RepositoryAccess, SystemClock, link::Consistency};
use forumauth_storage_sqlite::SqliteRepository;
use tracing::{info, info_span, warn};

use crate::util::database_pool_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Show the link of a local account or of a forum user
    #[command(group(ArgGroup::new("account").required(true).args(["local", "remote"])))]
    Show {
        /// The ID of the local account
        #[arg(long)]
        local: Option<LocalAccountId>,

        /// The ID of the forum user
        #[arg(long)]
        remote: Option<RemoteAccountId>,
    },

    /// Link a local account to a forum user
    Add {
        /// The ID of the local account
        local: LocalAccountId,

        /// The ID of the forum user
        remote: RemoteAccountId,
    },

    /// Remove the link of a forum user
    Remove {
        /// The ID of the forum user
        remote: RemoteAccountId,
    },

    /// Count the links
    Count,
}

fn log_link(link: &AccountLink) {
    info!(
        local_account.id = %link.local_account_id,
        remote_account.id = %link.remote_account_id,
        created_at = %link.created_at,
        "Found link"
    );
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        let config =
            DatabaseConfig::extract_or_default(figment).map_err(anyhow::Error::from_boxed)?;
        let pool = database_pool_from_config(&config).await?;
        let mut repo = SqliteRepository::from_pool(&pool).await?.boxed();

        let code = match self.subcommand {
            SC::Show { local, remote } => {
                let _span = info_span!("cli.link.show").entered();

                let link = match (local, remote) {
                    (Some(local), _) => {
                        repo.account_link()
                            .find_by_local(&local, Consistency::Replica)
                            .await?
                    }
                    (None, Some(remote)) => {
                        repo.account_link()
                            .find_by_remote(&remote, Consistency::Replica)
                            .await?
                    }
                    (None, None) => anyhow::bail!("either --local or --remote is required"),
                };

                if let Some(link) = link {
                    log_link(&link);
                    ExitCode::SUCCESS
                } else {
                    warn!("No link found");
                    ExitCode::FAILURE
                }
            }

            SC::Add { local, remote } => {
                let _span = info_span!(
                    "cli.link.add",
                    local_account.id = %local,
                    remote_account.id = %remote,
                )
                .entered();

                let clock = SystemClock::default();
                if let Some(link) = repo.account_link().add(&clock, &local, &remote).await? {
                    log_link(&link);
                    ExitCode::SUCCESS
                } else {
                    warn!("One of the two accounts is already linked");
                    ExitCode::FAILURE
                }
            }

            SC::Remove { remote } => {
                let _span = info_span!("cli.link.remove", remote_account.id = %remote).entered();

                if repo.account_link().remove(&remote).await? {
                    info!("Link removed");
                } else {
                    info!("The forum user was not linked");
                }
                ExitCode::SUCCESS
            }

            SC::Count => {
                let _span = info_span!("cli.link.count").entered();

                let count = repo.account_link().count().await?;
                info!(count, "Counted links");
                ExitCode::SUCCESS
            }
        };

        repo.save().await?;

        Ok(code)
    }
}
