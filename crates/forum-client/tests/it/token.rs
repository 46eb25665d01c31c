// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use assert_matches::assert_matches;
use forumauth_forum_client::{ClientError, RemoteIdentityFetcher};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_string_contains, method, path, query_param},
};

use crate::{ACCESS_TOKEN, AUTHORIZATION_CODE, init_test, redirect_uri};

#[tokio::test]
async fn pass_exchange_code() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .and(query_param("oauth/token", ""))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={AUTHORIZATION_CODE}")))
        .and(body_string_contains("client_secret="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "read",
            "user_id": 1234,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = client
        .exchange_code(AUTHORIZATION_CODE, &redirect_uri())
        .await
        .unwrap();

    assert_eq!(session.access_token(), ACCESS_TOKEN);
    // The token never shows up in logs
    assert!(!format!("{session:?}").contains(ACCESS_TOKEN));
}

#[tokio::test]
async fn fail_exchange_code_invalid_grant() {
    let (client, mock_server, _base_url) = init_test().await;

    Mock::given(method("POST"))
        .and(path("/index.php"))
        .and(query_param("oauth/token", ""))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The authorization code has expired",
        })))
        .mount(&mock_server)
        .await;

    let error = client
        .exchange_code(AUTHORIZATION_CODE, &redirect_uri())
        .await
        .unwrap_err();

    assert_matches!(error, ClientError::TokenExchange(_));
    assert!(error.to_string().contains("invalid_grant"));
}
