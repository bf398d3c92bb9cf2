//! Bitbucket v1 REST API client.
//!
//! A thin blocking wrapper over `reqwest` that attaches the bearer
//! credential, turns 4xx/5xx answers into [`Error::Api`] and walks the
//! paged `{values, isLastPage, nextPageStart}` envelope used by the list
//! endpoints.

use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Page size requested from list endpoints.
pub const PAGE_LIMIT: u32 = 1000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One page of a paged list response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default = "default_last_page")]
    pub is_last_page: bool,
    #[serde(default)]
    pub next_page_start: Option<u64>,
}

fn default_last_page() -> bool {
    true
}

/// Authenticated REST client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    token: String,
}

impl ApiClient {
    /// Create a client that authenticates with `token`.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("batch-tool/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }

    /// GET `url` and decode the JSON body.
    pub fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.execute(self.request(Method::GET, url), url)
    }

    /// Send `body` as JSON with `method` and decode the JSON answer.
    pub fn send<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, url)
    }

    /// Collect every value of a paged list endpoint.
    pub fn get_paged<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut base = Url::parse(url)?;
        base.query_pairs_mut()
            .append_pair("limit", &PAGE_LIMIT.to_string());

        let mut values = Vec::new();
        let mut start = 0u64;

        loop {
            let mut page_url = base.clone();
            if start > 0 {
                page_url
                    .query_pairs_mut()
                    .append_pair("start", &start.to_string());
            }

            let page: Page<T> = self.get(page_url.as_str())?;
            values.extend(page.values);

            match page.next_page_start {
                Some(next) if !page.is_last_page && next > start => start = next,
                _ => break,
            }
        }

        Ok(values)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let response = request.send().map_err(|e| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().map_err(|e| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if status.is_client_error() || status.is_server_error() {
            return Err(Error::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // Some endpoints (merge, delete) answer with an empty body
        let body = if body.trim().is_empty() { "null" } else { &body };
        Ok(serde_json::from_str(body)?)
    }
}
