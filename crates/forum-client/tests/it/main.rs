// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use forumauth_forum_client::ForumClient;
use url::Url;
use wiremock::MockServer;

mod authorization;
mod token;
mod users;

const REDIRECT_URI: &str = "http://wiki.localhost/Special:ForumAuthReturn";
const CLIENT_ID: &str = "client!+ID";
const CLIENT_SECRET: &str = "SECRET?%Gclient";
const AUTHORIZATION_CODE: &str = "authC0D3";
const ACCESS_TOKEN: &str = "AccessToken1";
const USER_ID: u64 = 1234;

async fn init_test() -> (ForumClient, MockServer, Url) {
    let http_client = forumauth_forum_client::http::client().expect("Couldn't build HTTP client");
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).expect("Couldn't parse URL");

    let client = ForumClient::new(
        http_client,
        &base_url,
        CLIENT_ID.to_owned(),
        CLIENT_SECRET.to_owned(),
    )
    .expect("Couldn't build forum client");

    (client, mock_server, base_url)
}

fn redirect_uri() -> Url {
    Url::parse(REDIRECT_URI).unwrap()
}
