// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::warn;

/// User agent sent with every catalog request
pub const USER_AGENT: &str = concat!("podfinder/", env!("CARGO_PKG_VERSION"));

/// Transport used by the catalog client; mocked in tests
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url` and return the whole body
    ///
    /// A non-success status is reported as an error, not as a body.
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error>;
}

/// reqwest-backed transport that asks for JSON and identifies itself
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to a default HTTP client");
                reqwest::Client::new()
            });

        Self { client }
    }

    /// Use a preconfigured reqwest client, e.g. one with a proxy
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
    }
}
