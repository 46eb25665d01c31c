// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use assert_matches::assert_matches;
use forumauth_data_model::RemoteAccountId;
use forumauth_forum_client::{AuthenticatedSession, ClientError, RemoteIdentityFetcher};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

use crate::{ACCESS_TOKEN, USER_ID, init_test};

#[tokio::test]
async fn pass_fetch_profile() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("users/me", ""))
        .and(query_param("oauth_token", ACCESS_TOKEN))
        .and(header(
            "authorization",
            format!("Bearer {ACCESS_TOKEN}").as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "user_id": USER_ID,
                "username": "alice",
                "user_email": "alice@example.com",
                "user_register_date": 1_500_000_000,
            },
            "system_info": {},
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = AuthenticatedSession::new(ACCESS_TOKEN.to_owned());
    let profile = client.fetch_profile(&session).await.unwrap();

    assert_eq!(profile.remote_account_id.as_str(), "1234");
    assert_eq!(profile.display_name.as_deref(), Some("alice"));
    assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
    assert_eq!(
        profile.attributes.get("user_register_date"),
        Some(&json!(1_500_000_000))
    );
}

#[tokio::test]
async fn fail_fetch_profile_unauthorized() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("users/me", ""))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": ["The access token is invalid"],
        })))
        .mount(&mock_server)
        .await;

    let session = AuthenticatedSession::new(ACCESS_TOKEN.to_owned());
    let error = client.fetch_profile(&session).await.unwrap_err();

    assert_matches!(error, ClientError::Http(e) if e.status().map(|s| s.as_u16()) == Some(401));
}

#[tokio::test]
async fn fail_fetch_profile_without_user() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("users/me", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "username": "alice" },
        })))
        .mount(&mock_server)
        .await;

    let session = AuthenticatedSession::new(ACCESS_TOKEN.to_owned());
    let error = client.fetch_profile(&session).await.unwrap_err();

    assert_matches!(error, ClientError::MissingUser);
}

#[tokio::test]
async fn pass_fetch_public_profile() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("users/1234", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "user_id": USER_ID,
                "username": "alice",
            },
        })))
        .mount(&mock_server)
        .await;

    let profile = client
        .fetch_public_profile(&RemoteAccountId::new("1234").unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(profile.full_name_with_id(), "alice (1234)");
    assert_eq!(profile.email, None);
}

#[tokio::test]
async fn pass_fetch_public_profile_unknown_user() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("users/999", ""))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": ["The requested user could not be found."],
        })))
        .mount(&mock_server)
        .await;

    let profile = client
        .fetch_public_profile(&RemoteAccountId::new("999").unwrap())
        .await
        .unwrap();

    assert_eq!(profile, None);
}
