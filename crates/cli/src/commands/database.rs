// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use forumauth_config::{
    ConfigurationSection, ConfigurationSectionExt, DatabaseConfig, ForumConfig,
};
use forumauth_provider::hooks::{
    ACCOUNT_LINKS_TABLE, ForumHooks, HookEvent, HookPayload, HookRegistry, Hooks, SchemaUpdater,
};
use forumauth_storage_sqlite::MIGRATOR;
use tracing::{Instrument, info, info_span};

use crate::util::database_connection_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Run database migrations
    Migrate,
}

/// Collects the tables the extensions want created
#[derive(Debug, Default)]
struct MigrationCollector {
    tables: Vec<String>,
}

impl SchemaUpdater for MigrationCollector {
    fn add_extension_table(&mut self, table: &str) {
        self.tables.push(table.to_owned());
    }
}

impl MigrationCollector {
    fn collect(registry: &HookRegistry) -> anyhow::Result<Self> {
        let mut collector = Self::default();
        registry
            .dispatch(
                HookEvent::LoadExtensionSchemaUpdates.as_str(),
                HookPayload::SchemaUpdates(&mut collector),
            )
            .context("could not collect the schema updates")?;

        Ok(collector)
    }

    fn wants(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }
}

fn hook_registry(database: &DatabaseConfig, button_icon: Option<String>) -> HookRegistry {
    let hooks: Arc<dyn Hooks> = Arc::new(ForumHooks::new(
        database.database_name.clone(),
        database.shared_database.clone(),
        button_icon,
    ));

    let mut registry = HookRegistry::new();
    registry.register_all(&hooks);
    registry
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let _span = info_span!("cli.database.migrate").entered();
        let config =
            DatabaseConfig::extract_or_default(figment).map_err(anyhow::Error::from_boxed)?;

        // The icon only matters for the forms, so a missing forum section is fine here
        let button_icon = ForumConfig::extract(figment)
            .ok()
            .and_then(|forum| forum.button_icon);

        let registry = hook_registry(&config, button_icon);
        let collector = MigrationCollector::collect(&registry)?;

        if !collector.wants(ACCOUNT_LINKS_TABLE) {
            info!(
                shared_database = config.shared_database.as_deref(),
                "The account links are managed by another deployment, skipping migrations"
            );
            return Ok(ExitCode::SUCCESS);
        }

        let mut conn = database_connection_from_config(&config).await?;

        // Run pending migrations
        MIGRATOR
            .run(&mut conn)
            .instrument(info_span!("db.migrate"))
            .await
            .context("could not run migrations")?;

        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(shared_database: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            database_name: "wiki_en".to_owned(),
            shared_database: shared_database.map(ToOwned::to_owned),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn own_database_gets_the_links_table() {
        let registry = hook_registry(&database(None), None);
        let collector = MigrationCollector::collect(&registry).unwrap();
        assert!(collector.wants(ACCOUNT_LINKS_TABLE));

        let registry = hook_registry(&database(Some("wiki_en")), None);
        let collector = MigrationCollector::collect(&registry).unwrap();
        assert!(collector.wants(ACCOUNT_LINKS_TABLE));
    }

    #[test]
    fn foreign_shared_database_is_left_alone() {
        let registry = hook_registry(&database(Some("wiki_shared")), None);
        let collector = MigrationCollector::collect(&registry).unwrap();
        assert!(!collector.wants(ACCOUNT_LINKS_TABLE));
    }
}
