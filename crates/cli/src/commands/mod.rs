// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

mod config;
mod database;
mod link;
mod remote;

#[derive(Parser, Debug)]
enum Subcommand {
    /// Configuration-related commands
    Config(self::config::Options),

    /// Manage the database
    Database(self::database::Options),

    /// Inspect and manage the account links
    Link(self::link::Options),

    /// Query the forum
    Remote(self::remote::Options),
}

#[derive(Parser, Debug)]
#[command(version)]
pub struct Options {
    /// Path to the configuration file
    ///
    /// Can be repeated before the subcommand, later files take precedence
    #[arg(short, long, action = clap::ArgAction::Append)]
    config: Vec<Utf8PathBuf>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as S;
        match self.subcommand {
            S::Config(c) => c.run(figment).await,
            S::Database(c) => c.run(figment).await,
            S::Link(c) => c.run(figment).await,
            S::Remote(c) => c.run(figment).await,
        }
    }

    /// Get a [`Figment`] instance with the configuration loaded
    pub fn figment(&self) -> Figment {
        let configs = if self.config.is_empty() {
            // Read the FORUMAUTH_CONFIG environment variable
            std::env::var("FORUMAUTH_CONFIG")
                // Default to "config.yaml"
                .unwrap_or_else(|_| "config.yaml".to_owned())
                // Split the file list on `:`
                .split(':')
                .map(Utf8PathBuf::from)
                .collect()
        } else {
            self.config.clone()
        };

        let base = Figment::new().merge(Env::prefixed("FORUMAUTH_").split("__"));

        configs
            .into_iter()
            .fold(base, |f, path| f.admerge(Yaml::file(path)))
    }
}
