// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use forumauth_data_model::{LocalAccount, LocalAccountId, RemoteAccountId, RemoteProfile};
use forumauth_forum_client::RemoteIdentityFetcher;
use forumauth_storage::{
    BoxClock, BoxRepository, BoxRepositoryFactory, RepositoryAccess, RepositoryError,
    link::Consistency,
};
use url::Url;

use crate::{
    accounts::BoxHostAccounts,
    error::AuthError,
    pending::{PendingLinkSealer, PendingLinkToken},
    requests::{
        AuthAction, AuthenticationRequest, BUTTON_REQUEST_NAME, ButtonRequest,
        RemoteProfileRequest, RemoveRequest, ServerAuthenticationRequest,
    },
    response::{AuthenticationResponse, CredentialsDescription, DataChangeStatus},
};

/// The error code sent back by the forum when the user refused the access
const ACCESS_DENIED: &str = "access_denied";

/// The message key of the provider name
const SERVICE_NAME: &str = "forumauth-auth-service-name";

/// Settings of the [`ForumAuthProvider`]
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// Create a local account on the first login of a forum user
    pub auto_create: bool,

    /// The callback URL given to the forum, overriding the one given by the
    /// host
    pub redirect_uri: Option<Url>,
}

/// Logs users in with their forum account
///
/// The provider keeps no state between two calls: everything it needs is
/// carried by the requests the host hands back.
pub struct ForumAuthProvider {
    repository_factory: BoxRepositoryFactory,
    fetcher: Arc<dyn RemoteIdentityFetcher>,
    accounts: BoxHostAccounts,
    sealer: PendingLinkSealer,
    clock: BoxClock,
    settings: ProviderSettings,
}

impl ForumAuthProvider {
    /// Create a new provider
    #[must_use]
    pub fn new(
        repository_factory: BoxRepositoryFactory,
        fetcher: Arc<dyn RemoteIdentityFetcher>,
        accounts: BoxHostAccounts,
        sealer: PendingLinkSealer,
        clock: BoxClock,
        settings: ProviderSettings,
    ) -> Self {
        Self {
            repository_factory,
            fetcher,
            accounts,
            sealer,
            clock,
            settings,
        }
    }

    async fn repository(&self) -> Result<BoxRepository, RepositoryError> {
        self.repository_factory.create().await
    }

    /// The requests the provider needs for an action
    ///
    /// # Errors
    ///
    /// Returns an error if the link of the account could not be looked up
    #[tracing::instrument(name = "provider.authentication_requests", skip(self))]
    pub async fn authentication_requests(
        &self,
        action: AuthAction,
        username: Option<&str>,
    ) -> Result<Vec<AuthenticationRequest>, AuthError> {
        let button = match action {
            AuthAction::Login => ButtonRequest::forum("forumauth", "forumauth-loginbutton-help"),
            AuthAction::Link => ButtonRequest::forum("forumauth-form-merge", "forumauth-link-help"),
            AuthAction::Create => ButtonRequest::forum("forumauth-create", "forumauth-link-help"),
            AuthAction::Remove => {
                let Some(username) = username else {
                    return Ok(Vec::new());
                };
                let Some(account) = self.accounts.find_by_name(username).await? else {
                    return Ok(Vec::new());
                };

                let mut repo = self.repository().await?;
                let link = repo
                    .account_link()
                    .find_by_local(&account.id, Consistency::Replica)
                    .await?;
                repo.cancel().await?;

                return Ok(link
                    .map(|link| {
                        AuthenticationRequest::Remove(RemoveRequest {
                            username: account.name,
                            remote_account_id: link.remote_account_id,
                        })
                    })
                    .into_iter()
                    .collect());
            }
            AuthAction::Change | AuthAction::Unlink => return Ok(Vec::new()),
        };

        Ok(vec![AuthenticationRequest::Button(button)])
    }

    /// Start a login
    #[tracing::instrument(name = "provider.begin_authentication", skip_all)]
    pub fn begin_authentication(&self, requests: &[AuthenticationRequest]) -> AuthenticationResponse {
        self.begin(requests)
    }

    /// Start linking the forum user to an existing account
    #[tracing::instrument(name = "provider.begin_account_link", skip_all)]
    pub fn begin_account_link(&self, requests: &[AuthenticationRequest]) -> AuthenticationResponse {
        self.begin(requests)
    }

    /// Start creating an account
    ///
    /// If the requests already carry a forum profile which isn't linked yet,
    /// no new authorization is needed.
    #[tracing::instrument(name = "provider.begin_account_creation", skip_all)]
    pub async fn begin_account_creation(
        &self,
        requests: &[AuthenticationRequest],
    ) -> AuthenticationResponse {
        if let Some(request) = AuthenticationRequest::find_remote_profile(requests) {
            let free = match self.unseal(&request.token) {
                Ok(profile) => self
                    .is_free(&profile.remote_account_id)
                    .await
                    .map_err(AuthError::from),
                Err(e) => Err(e),
            };

            match free {
                Ok(true) => {
                    return AuthenticationResponse::pass_with_link(None, request.clone());
                }
                Ok(false) => {
                    tracing::debug!("The pending forum user is already linked");
                }
                Err(e) => {
                    tracing::warn!(
                        error = &e as &dyn std::error::Error,
                        "Could not use the pending forum user"
                    );
                }
            }
        }

        self.begin(requests)
    }

    /// Continue a login, once the user is back from the forum
    #[tracing::instrument(name = "provider.continue_authentication", skip_all)]
    pub async fn continue_authentication(
        &self,
        requests: &[AuthenticationRequest],
    ) -> AuthenticationResponse {
        let profile = match self.exchange(requests).await {
            Ok(profile) => profile,
            Err(e) => return e.into(),
        };

        self.resolve_login(profile)
            .await
            .map_err(|e| match e {
                AuthError::StorageError(Some(source)) => AuthError::provider(source),
                e => e,
            })
            .into()
    }

    async fn resolve_login(&self, profile: RemoteProfile) -> Result<AuthenticationResponse, AuthError> {
        let mut repo = self.repository().await?;
        let link = repo
            .account_link()
            .find_by_remote(&profile.remote_account_id, Consistency::Latest)
            .await?;
        repo.cancel().await?;

        if let Some(link) = link {
            let Some(account) = self.accounts.find_by_id(&link.local_account_id).await? else {
                tracing::error!(
                    local_account_id = %link.local_account_id,
                    remote_account_id = %link.remote_account_id,
                    "The forum user is linked to an account the host doesn't know"
                );
                return Err(AuthError::StorageError(None));
            };

            tracing::info!(
                local_account_id = %account.id,
                remote_account_id = %profile.remote_account_id,
                "Logging in a linked forum user"
            );
            return Ok(AuthenticationResponse::pass(Some(account.name)));
        }

        let request = RemoteProfileRequest {
            token: self.seal(&profile)?,
        };

        if self.settings.auto_create {
            if let Some(name) = &profile.display_name {
                if self.accounts.find_by_name(name).await?.is_some() {
                    return Err(AuthError::NameCollision(name.clone()));
                }

                tracing::info!(
                    remote_account_id = %profile.remote_account_id,
                    "Creating an account for a new forum user"
                );
                return Ok(AuthenticationResponse::pass_with_link(
                    Some(name.clone()),
                    request,
                ));
            }
        }

        Ok(AuthenticationResponse::Pass {
            username: None,
            link_request: Some(request.clone()),
            create_request: Some(request),
        })
    }

    /// Continue the creation of an account, once the user is back from the
    /// forum
    #[tracing::instrument(name = "provider.continue_account_creation", skip_all)]
    pub async fn continue_account_creation(
        &self,
        requests: &[AuthenticationRequest],
    ) -> AuthenticationResponse {
        let profile = match self.exchange(requests).await {
            Ok(profile) => profile,
            Err(e) => return e.into(),
        };

        self.resolve_creation(profile)
            .await
            .map_err(|e| match e {
                AuthError::StorageError(Some(source)) => AuthError::provider(source),
                e => e,
            })
            .into()
    }

    async fn resolve_creation(
        &self,
        profile: RemoteProfile,
    ) -> Result<AuthenticationResponse, AuthError> {
        if !self.is_free(&profile.remote_account_id).await? {
            return Err(AuthError::AlreadyLinkedElsewhere);
        }

        let token = self.seal(&profile)?;
        Ok(AuthenticationResponse::pass_with_link(
            None,
            RemoteProfileRequest { token },
        ))
    }

    /// Continue linking the forum user to an existing account, once the user
    /// is back from the forum
    #[tracing::instrument(
        name = "provider.continue_account_link",
        skip_all,
        fields(local_account_id = %account.id),
    )]
    pub async fn continue_account_link(
        &self,
        account: &LocalAccount,
        requests: &[AuthenticationRequest],
    ) -> AuthenticationResponse {
        let profile = match self.exchange(requests).await {
            Ok(profile) => profile,
            Err(e) => return e.into(),
        };

        self.link(&account.id, &profile.remote_account_id)
            .await
            .map(|()| AuthenticationResponse::pass(None))
            .into()
    }

    async fn link(
        &self,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<(), AuthError> {
        let mut repo = self.repository().await?;

        let existing = repo
            .account_link()
            .find_by_remote(remote_account_id, Consistency::Latest)
            .await?;

        match existing {
            Some(link) if link.local_account_id != *local_account_id => {
                return Err(AuthError::AlreadyLinkedElsewhere);
            }
            Some(_) => return Err(AuthError::AlreadyLinkedSame),
            None => {}
        }

        let added = repo
            .account_link()
            .add(&self.clock, local_account_id, remote_account_id)
            .await?;

        if added.is_some() {
            repo.save().await?;
            tracing::info!(%remote_account_id, "Linked the forum user");
            return Ok(());
        }

        repo.cancel().await?;
        tracing::debug!(%remote_account_id, "The link was refused, looking for a concurrent one");

        let mut repo = self.repository().await?;
        let owner = repo
            .account_link()
            .find_by_remote(remote_account_id, Consistency::Latest)
            .await?;
        repo.cancel().await?;

        match owner {
            Some(link) if link.local_account_id != *local_account_id => {
                Err(AuthError::AlreadyLinkedElsewhere)
            }
            _ => Err(AuthError::StorageError(None)),
        }
    }

    /// Commit the pending link of an account the host created on its own
    /// after a login
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, or if the link could not be
    /// stored
    #[tracing::instrument(
        name = "provider.auto_created_account",
        skip_all,
        fields(local_account_id = %account.id),
    )]
    pub async fn auto_created_account(
        &self,
        account: &LocalAccount,
        token: &PendingLinkToken,
    ) -> Result<(), AuthError> {
        self.commit_pending_link(account, token).await
    }

    /// Commit the pending link of an account created through the account
    /// creation flow
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid, or if the link could not be
    /// stored
    #[tracing::instrument(
        name = "provider.finish_account_creation",
        skip_all,
        fields(local_account_id = %account.id),
    )]
    pub async fn finish_account_creation(
        &self,
        account: &LocalAccount,
        token: &PendingLinkToken,
    ) -> Result<(), AuthError> {
        self.commit_pending_link(account, token).await
    }

    async fn commit_pending_link(
        &self,
        account: &LocalAccount,
        token: &PendingLinkToken,
    ) -> Result<(), AuthError> {
        let profile = self.unseal(token)?;

        let mut repo = self.repository().await?;
        let added = repo
            .account_link()
            .add(&self.clock, &account.id, &profile.remote_account_id)
            .await?;

        if added.is_none() {
            tracing::debug!(
                remote_account_id = %profile.remote_account_id,
                "Either account is already linked"
            );
            repo.cancel().await?;
            return Err(AuthError::StorageError(None));
        }

        repo.save().await?;

        if let Some(email) = &profile.email {
            if let Err(e) = self.accounts.set_email(&account.id, email).await {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    "Could not set the email of the new account"
                );
            }
        }

        Ok(())
    }

    /// Check whether the provider accepts a change of credentials
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLinked`] if the request is about a forum user
    /// which isn't the one linked to the account
    #[tracing::instrument(name = "provider.allows_authentication_data_change", skip_all)]
    pub async fn allows_authentication_data_change(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<DataChangeStatus, AuthError> {
        let AuthenticationRequest::Remove(request) = request else {
            return Ok(DataChangeStatus::Ignored);
        };

        let account = self.remove_request_account(request).await?;

        let mut repo = self.repository().await?;
        let link = repo
            .account_link()
            .find_by_local(&account.id, Consistency::Latest)
            .await?;
        repo.cancel().await?;

        match link {
            Some(link) if link.remote_account_id != request.remote_account_id => {
                Err(AuthError::NotLinked)
            }
            _ => Ok(DataChangeStatus::Good),
        }
    }

    /// Apply a change of credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the link could not be removed
    #[tracing::instrument(name = "provider.change_authentication_data", skip_all)]
    pub async fn change_authentication_data(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<(), AuthError> {
        let AuthenticationRequest::Remove(request) = request else {
            return Ok(());
        };

        let account = self.remove_request_account(request).await?;
        self.unlink(&account.id, &request.remote_account_id).await
    }

    async fn remove_request_account(
        &self,
        request: &RemoveRequest,
    ) -> Result<LocalAccount, AuthError> {
        self.accounts
            .find_by_name(&request.username)
            .await?
            .ok_or(AuthError::NotLinked)
    }

    /// Remove the link between an account and a forum user
    ///
    /// Nothing happens if the account isn't linked.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLinked`] if the account is linked to another
    /// forum user
    #[tracing::instrument(
        name = "provider.unlink",
        skip_all,
        fields(%local_account_id, %remote_account_id),
    )]
    pub async fn unlink(
        &self,
        local_account_id: &LocalAccountId,
        remote_account_id: &RemoteAccountId,
    ) -> Result<(), AuthError> {
        let mut repo = self.repository().await?;

        let link = repo
            .account_link()
            .find_by_local(local_account_id, Consistency::Latest)
            .await?;

        match link {
            None => {
                tracing::debug!("The account is not linked, nothing to do");
                repo.cancel().await?;
                Ok(())
            }
            Some(link) if link.remote_account_id != *remote_account_id => {
                repo.cancel().await?;
                Err(AuthError::NotLinked)
            }
            Some(_) => {
                repo.account_link().remove(remote_account_id).await?;
                repo.save().await?;
                tracing::info!("Unlinked the forum user");
                Ok(())
            }
        }
    }

    /// Check whether the named account can log in with the forum, which is
    /// the case if it is linked
    #[tracing::instrument(name = "provider.test_user_can_authenticate", skip(self))]
    pub async fn test_user_can_authenticate(&self, username: &str) -> bool {
        self.is_linked(username).await.unwrap_or_else(|e| {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "Could not check the link of the account"
            );
            false
        })
    }

    /// Describe the forum account of a removal request
    #[tracing::instrument(
        name = "provider.describe_credentials",
        skip_all,
        fields(remote_account_id = %request.remote_account_id),
    )]
    pub async fn describe_credentials(&self, request: &RemoveRequest) -> CredentialsDescription {
        let account = match self
            .fetcher
            .fetch_public_profile(&request.remote_account_id)
            .await
        {
            Ok(Some(profile)) => profile.full_name_with_id(),
            Ok(None) => request.remote_account_id.to_string(),
            Err(e) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    "Could not fetch the forum user"
                );
                request.remote_account_id.to_string()
            }
        };

        CredentialsDescription {
            provider: SERVICE_NAME,
            account,
        }
    }

    fn begin(&self, requests: &[AuthenticationRequest]) -> AuthenticationResponse {
        let Some(button) = AuthenticationRequest::find_button(requests, BUTTON_REQUEST_NAME) else {
            return AuthenticationResponse::Abstain;
        };

        let Some(return_to_url) = self
            .settings
            .redirect_uri
            .as_ref()
            .or(button.return_to_url.as_ref())
        else {
            return AuthError::provider("no return URL").into();
        };

        let authorization = self.fetcher.authorization_url(return_to_url);
        tracing::debug!("Redirecting to the forum");

        AuthenticationResponse::Redirect {
            url: authorization.url,
            request: ServerAuthenticationRequest::new(return_to_url.clone(), authorization.state),
        }
    }

    async fn exchange(&self, requests: &[AuthenticationRequest]) -> Result<RemoteProfile, AuthError> {
        let request =
            AuthenticationRequest::find_server(requests).ok_or(AuthError::NoAuthenticationWorkflow)?;

        match request.error.as_deref() {
            Some(ACCESS_DENIED) => return Err(AuthError::AuthenticationDenied),
            Some(error) => return Err(AuthError::provider(error)),
            None => {}
        }

        let Some(code) = &request.code else {
            return Err(AuthError::provider("unknown"));
        };

        if request.state.as_deref() != Some(request.expected_state.as_str()) {
            tracing::warn!("The forum sent back an unexpected state");
            return Err(AuthError::provider("state mismatch"));
        }

        let session = self
            .fetcher
            .exchange_code(code, &request.return_to_url)
            .await
            .map_err(AuthError::provider)?;

        self.fetcher
            .fetch_profile(&session)
            .await
            .map_err(AuthError::provider)
    }

    async fn is_linked(&self, username: &str) -> Result<bool, AuthError> {
        let Some(account) = self.accounts.find_by_name(username).await? else {
            return Ok(false);
        };

        let mut repo = self.repository().await?;
        let link = repo
            .account_link()
            .find_by_local(&account.id, Consistency::Replica)
            .await?;
        repo.cancel().await?;

        Ok(link.is_some())
    }

    async fn is_free(&self, remote_account_id: &RemoteAccountId) -> Result<bool, RepositoryError> {
        let mut repo = self.repository().await?;
        let link = repo
            .account_link()
            .find_by_remote(remote_account_id, Consistency::Latest)
            .await?;
        repo.cancel().await?;

        Ok(link.is_none())
    }

    fn seal(&self, profile: &RemoteProfile) -> Result<PendingLinkToken, AuthError> {
        self.sealer.seal(&self.clock, profile).map_err(|e| {
            tracing::error!(
                error = &e as &dyn std::error::Error,
                "Could not seal the pending link"
            );
            AuthError::InvalidPendingLink
        })
    }

    fn unseal(&self, token: &PendingLinkToken) -> Result<RemoteProfile, AuthError> {
        self.sealer.unseal(&self.clock, token).map_err(|e| {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "Rejected a pending link"
            );
            AuthError::InvalidPendingLink
        })
    }
}
