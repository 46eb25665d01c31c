// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::borrow::Cow;

use async_trait::async_trait;
use forumauth_data_model::{RemoteAccountId, RemoteProfile};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::{
    AuthenticatedSession, AuthorizationRequest, RemoteIdentityFetcher, endpoints::Endpoints,
    error::ClientError,
};

/// The only scope we need, which gives access to the user profile
const SCOPE_READ: &str = "read";

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[derive(Deserialize)]
struct UserResponse {
    user: Option<Map<String, Value>>,
}

impl UserResponse {
    fn into_profile(self) -> Result<RemoteProfile, ClientError> {
        self.user
            .and_then(RemoteProfile::from_user_info)
            .ok_or(ClientError::MissingUser)
    }
}

/// A [`RemoteIdentityFetcher`] talking to a XenForo forum with the bdApi
/// add-on
#[derive(Debug, Clone)]
pub struct ForumClient {
    http_client: reqwest::Client,
    oauth2_client: ConfiguredClient,
    endpoints: Endpoints,
}

impl ForumClient {
    /// Create a new client for the forum at the given base URL
    ///
    /// # Errors
    ///
    /// Returns an error if the API endpoints can't be derived from the base
    /// URL
    pub fn new(
        http_client: reqwest::Client,
        base_url: &Url,
        client_id: String,
        client_secret: String,
    ) -> Result<Self, ClientError> {
        let endpoints = Endpoints::new(base_url)?;

        let oauth2_client = BasicClient::new(ClientId::new(client_id))
            .set_client_secret(ClientSecret::new(client_secret))
            .set_auth_uri(AuthUrl::from_url(endpoints.authorize()))
            .set_token_uri(TokenUrl::from_url(endpoints.token()))
            .set_auth_type(AuthType::RequestBody);

        Ok(Self {
            http_client,
            oauth2_client,
            endpoints,
        })
    }

    /// The API endpoints used by this client
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_user(
        &self,
        url: Url,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self.http_client.get(url);
        if let Some(access_token) = access_token {
            request = request.bearer_auth(access_token);
        }

        request.send().await
    }
}

#[async_trait]
impl RemoteIdentityFetcher for ForumClient {
    fn authorization_url(&self, redirect_uri: &Url) -> AuthorizationRequest {
        let (url, state) = self
            .oauth2_client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(SCOPE_READ.to_owned()))
            .set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
            .url();

        AuthorizationRequest {
            url,
            state: state.secret().clone(),
        }
    }

    #[tracing::instrument(name = "forum_client.exchange_code", skip_all, err)]
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &Url,
    ) -> Result<AuthenticatedSession, ClientError> {
        tracing::debug!("Exchanging the authorization code…");

        let response = self
            .oauth2_client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .set_redirect_uri(Cow::Owned(RedirectUrl::from_url(redirect_uri.clone())))
            .request_async(&self.http_client)
            .await?;

        Ok(AuthenticatedSession::new(
            response.access_token().secret().clone(),
        ))
    }

    #[tracing::instrument(name = "forum_client.fetch_profile", skip_all, err)]
    async fn fetch_profile(
        &self,
        session: &AuthenticatedSession,
    ) -> Result<RemoteProfile, ClientError> {
        tracing::debug!("Fetching the profile of the authenticated user…");

        let url = self.endpoints.me(session.access_token());
        let response: UserResponse = self
            .get_user(url, Some(session.access_token()))
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_profile()
    }

    #[tracing::instrument(
        name = "forum_client.fetch_public_profile",
        skip_all,
        fields(remote_account_id = %remote_account_id),
        err,
    )]
    async fn fetch_public_profile(
        &self,
        remote_account_id: &RemoteAccountId,
    ) -> Result<Option<RemoteProfile>, ClientError> {
        let url = self.endpoints.user(remote_account_id);
        let response = self.get_user(url, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("The forum doesn't know this user");
            return Ok(None);
        }

        let response: UserResponse = response.error_for_status()?.json().await?;
        response.into_profile().map(Some)
    }
}
