// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! A module containing the SQLite implementation of the
//! [`AccountLinkRepository`].
//!
//! [`AccountLinkRepository`]: forumauth_storage::link::AccountLinkRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forumauth_data_model::{AccountLink, LocalAccountId, RemoteAccountId};
use forumauth_storage::{
    Clock,
    link::{AccountLinkRepository, Consistency},
};
use sqlx::SqliteConnection;

use crate::{DatabaseError, DatabaseInconsistencyError, tracing::ExecuteExt};

/// An implementation of [`AccountLinkRepository`] for a SQLite connection
pub struct SqliteAccountLinkRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteAccountLinkRepository<'c> {
    /// Create a new [`SqliteAccountLinkRepository`] from an active SQLite
    /// connection
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

#[derive(sqlx::FromRow)]
struct LinkLookup {
    local_account_id: String,
    remote_account_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LinkLookup> for AccountLink {
    type Error = DatabaseInconsistencyError;

    fn try_from(value: LinkLookup) -> Result<Self, Self::Error> {
        let local_account_id = LocalAccountId::new(value.local_account_id).map_err(|e| {
            DatabaseInconsistencyError::on("forum_account_links", "local_account_id")
                .row(value.remote_account_id.clone())
                .with_source(e)
        })?;

        let remote_account_id = RemoteAccountId::new(value.remote_account_id).map_err(|e| {
            DatabaseInconsistencyError::on("forum_account_links", "remote_account_id")
                .row(local_account_id.as_str())
                .with_source(e)
        })?;

        Ok(AccountLink {
            local_account_id,
            remote_account_id,
            created_at: value.created_at,
        })
    }
}

// Both consistency levels are served by the same transaction connection,
// which always sees the latest committed state. There are no replicas with
// SQLite.
#[async_trait]
impl AccountLinkRepository for SqliteAccountLinkRepository<'_> {
    type Error = DatabaseError;

    #[tracing::instrument(
        name = "db.account_link.find_by_remote",
        skip_all,
        fields(
            db.query.text,
            account_link.remote_account_id = %remote_account_id,
        ),
        err,
    )]
    async fn find_by_remote(
        &mut self,
        remote_account_id: &RemoteAccountId,
        _consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        let res = sqlx::query_as::<_, LinkLookup>(
            r"
                SELECT local_account_id
                     , remote_account_id
                     , created_at
                FROM forum_account_links
                WHERE remote_account_id = ?1
            ",
        )
        .bind(remote_account_id.as_str())
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        Ok(Some(res.try_into()?))
    }

    #[tracing::instrument(
        name = "db.account_link.find_by_local",
        skip_all,
        fields(
            db.query.text,
            account_link.local_account_id = %local_account_id,
        ),
        err,
    )]
    async fn find_by_local(
        &mut self,
        local_account_id: &LocalAccountId,
        _consistency: Consistency,
    ) -> Result<Option<AccountLink>, Self::Error> {
        let res = sqlx::query_as::<_, LinkLookup>(
            r"
                SELECT local_account_id
                     , remote_account_id
                     , created_at
                FROM forum_account_links
                WHERE local_account_id = ?1
            ",
        )
        .bind(local_account_id.as_str())
        .traced()
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(res) = res else { return Ok(None) };

        Ok(Some(res.try_into()?))
    }

    #[tracing::instrument(
        name = "db.account_link.add",
        skip_all,
        fields(
            db.query.text,
            account_link.local_account_id = %local_account_id,
            account_link.remote_account_id = %remote_account_id,
        ),
        err,
    )]
    async fn add(
        &mut self,
        clock: &dyn Clock,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<AccountLink>, Self::Error> {
        let created_at = clock.now();

        let res = sqlx::query(
            r"
                INSERT INTO forum_account_links
                    (local_account_id, remote_account_id, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(local_account_id.as_str())
        .bind(remote_account_id.as_str())
        .bind(created_at)
        .traced()
        .execute(&mut *self.conn)
        .await
        .map_err(DatabaseError::from);

        match res {
            Ok(_) => Ok(Some(AccountLink {
                local_account_id: local_account_id.clone(),
                remote_account_id: remote_account_id.clone(),
                created_at,
            })),
            Err(e) if e.is_unique_violation() => {
                tracing::debug!(
                    error = &e as &dyn std::error::Error,
                    "One of the accounts is already linked"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(
        name = "db.account_link.remove",
        skip_all,
        fields(
            db.query.text,
            account_link.remote_account_id = %remote_account_id,
        ),
        err,
    )]
    async fn remove(&mut self, remote_account_id: &RemoteAccountId) -> Result<bool, Self::Error> {
        let res = sqlx::query(
            r"
                DELETE FROM forum_account_links
                WHERE remote_account_id = ?1
            ",
        )
        .bind(remote_account_id.as_str())
        .traced()
        .execute(&mut *self.conn)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    #[tracing::instrument(
        name = "db.account_link.count",
        skip_all,
        fields(db.query.text),
        err,
    )]
    async fn count(&mut self) -> Result<usize, Self::Error> {
        let count: i64 = sqlx::query_scalar(
            r"
                SELECT COUNT(*)
                FROM forum_account_links
            ",
        )
        .traced()
        .fetch_one(&mut *self.conn)
        .await?;

        count
            .try_into()
            .map_err(DatabaseError::to_invalid_operation)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use forumauth_data_model::{LocalAccountId, RemoteAccountId};
    use forumauth_storage::{
        Clock, RepositoryAccess,
        clock::MockClock,
        link::{AccountLinkRepository, Consistency},
    };
    use sqlx::SqlitePool;

    use crate::SqliteRepository;

    fn local(id: &str) -> LocalAccountId {
        LocalAccountId::new(id).unwrap()
    }

    fn remote(id: &str) -> RemoteAccountId {
        RemoteAccountId::new(id).unwrap()
    }

    /// Test the basic lifecycle of a link: add, lookup both ways, remove
    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_link_repository(pool: SqlitePool) {
        let clock = MockClock::default();
        let mut repo = SqliteRepository::from_pool(&pool).await.unwrap().boxed();

        let alice = local("1");
        let forum_alice = remote("1234");

        // Initially, nothing is linked
        assert_eq!(repo.account_link().count().await.unwrap(), 0);
        assert!(
            repo.account_link()
                .find_by_remote(&forum_alice, Consistency::Latest)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.account_link()
                .find_by_local(&alice, Consistency::Replica)
                .await
                .unwrap()
                .is_none()
        );

        let link = repo
            .account_link()
            .add(&clock, &alice, &forum_alice)
            .await
            .unwrap()
            .expect("the link should be created");
        assert_eq!(link.local_account_id, alice);
        assert_eq!(link.remote_account_id, forum_alice);
        assert_eq!(link.created_at, clock.now());

        // Both lookups return the same link
        let by_remote = repo
            .account_link()
            .find_by_remote(&forum_alice, Consistency::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_remote, link);

        let by_local = repo
            .account_link()
            .find_by_local(&alice, Consistency::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_local, link);

        assert_eq!(repo.account_link().count().await.unwrap(), 1);

        // Removing the link works once
        assert!(repo.account_link().remove(&forum_alice).await.unwrap());
        assert!(!repo.account_link().remove(&forum_alice).await.unwrap());
        assert!(
            repo.account_link()
                .find_by_local(&alice, Consistency::Latest)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(repo.account_link().count().await.unwrap(), 0);

        repo.save().await.unwrap();
    }

    /// Each side of a link can only be linked once
    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_link_uniqueness(pool: SqlitePool) {
        let clock = MockClock::default();
        let mut repo = SqliteRepository::from_pool(&pool).await.unwrap().boxed();

        repo.account_link()
            .add(&clock, &local("1"), &remote("1234"))
            .await
            .unwrap()
            .unwrap();

        // The same remote account can't be linked to another local account
        let res = repo
            .account_link()
            .add(&clock, &local("2"), &remote("1234"))
            .await
            .unwrap();
        assert!(res.is_none());

        // The same local account can't be linked to another remote account
        let res = repo
            .account_link()
            .add(&clock, &local("1"), &remote("5678"))
            .await
            .unwrap();
        assert!(res.is_none());

        // The same pair can't be added twice either
        let res = repo
            .account_link()
            .add(&clock, &local("1"), &remote("1234"))
            .await
            .unwrap();
        assert!(res.is_none());

        // Failed inserts didn't break the transaction
        let link = repo
            .account_link()
            .find_by_remote(&remote("1234"), Consistency::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link.local_account_id, local("1"));
        assert_eq!(repo.account_link().count().await.unwrap(), 1);

        // Once removed, both accounts can be linked again
        clock.advance(Duration::minutes(5));
        assert!(repo.account_link().remove(&remote("1234")).await.unwrap());
        let link = repo
            .account_link()
            .add(&clock, &local("2"), &remote("1234"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link.created_at, clock.now());

        repo.save().await.unwrap();
    }

    /// Two transactions trying to link the same forum user: only the first one
    /// to commit wins
    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_link_race(pool: SqlitePool) {
        let clock = MockClock::default();

        let mut first = SqliteRepository::from_pool(&pool).await.unwrap().boxed();
        let mut second = SqliteRepository::from_pool(&pool).await.unwrap().boxed();

        let link = first
            .account_link()
            .add(&clock, &local("1"), &remote("1234"))
            .await
            .unwrap();
        assert!(link.is_some());
        first.save().await.unwrap();

        let link = second
            .account_link()
            .add(&clock, &local("2"), &remote("1234"))
            .await
            .unwrap();
        assert!(link.is_none());
        second.cancel().await.unwrap();

        let mut repo = SqliteRepository::from_pool(&pool).await.unwrap().boxed();
        let link = repo
            .account_link()
            .find_by_remote(&remote("1234"), Consistency::Latest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link.local_account_id, local("1"));
        repo.cancel().await.unwrap();
    }

    /// Changes are discarded if the transaction is cancelled
    #[sqlx::test(migrator = "crate::MIGRATOR")]
    async fn test_link_cancel(pool: SqlitePool) {
        let clock = MockClock::default();

        let mut repo = SqliteRepository::from_pool(&pool).await.unwrap().boxed();
        repo.account_link()
            .add(&clock, &local("1"), &remote("1234"))
            .await
            .unwrap()
            .unwrap();
        repo.cancel().await.unwrap();

        let mut repo = SqliteRepository::from_pool(&pool).await.unwrap().boxed();
        assert_eq!(repo.account_link().count().await.unwrap(), 0);
        repo.cancel().await.unwrap();
    }
}
