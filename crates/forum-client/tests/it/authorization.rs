// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::HashMap;

use forumauth_forum_client::RemoteIdentityFetcher;

use crate::{CLIENT_ID, REDIRECT_URI, init_test, redirect_uri};

#[tokio::test]
async fn pass_authorization_url() {
    let (client, _mock_server, base_url) = init_test().await;

    let request = client.authorization_url(&redirect_uri());

    assert_eq!(request.url.origin(), base_url.origin());
    assert_eq!(request.url.path(), "/index.php");
    assert!(
        request
            .url
            .query()
            .unwrap()
            .starts_with("oauth/authorize&")
    );

    let query_pairs: HashMap<_, _> = request.url.query_pairs().collect();
    assert_eq!(query_pairs.get("response_type").unwrap(), "code");
    assert_eq!(query_pairs.get("client_id").unwrap(), CLIENT_ID);
    assert_eq!(query_pairs.get("redirect_uri").unwrap(), REDIRECT_URI);
    assert_eq!(query_pairs.get("scope").unwrap(), "read");
    assert_eq!(query_pairs.get("state").unwrap(), &request.state);
}

#[tokio::test]
async fn pass_authorization_url_random_state() {
    let (client, _mock_server, _base_url) = init_test().await;

    let first = client.authorization_url(&redirect_uri());
    let second = client.authorization_url(&redirect_uri());

    assert!(!first.state.is_empty());
    assert_ne!(first.state, second.state);
}
