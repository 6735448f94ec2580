//! HTTP client for the Backend Gateway.
//!
//! Two surfaces share one `reqwest::Client`: [`GatewayClient::forward`]
//! relays a call and hands back the upstream status and JSON body untouched
//! (the proxy's pass-through), while the typed methods decode the documented
//! response shapes and treat any non-2xx status as an error (the dashboard).
//! None of them retry.

use std::time::Duration;

use hotposts_core::{
    Category, CrawlOutcome, Keyword, Post, PostPage, PostQuery, Stats, TrendingKeywords,
};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// Status and JSON body of a forwarded call.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

/// Client for the Backend Gateway HTTP API.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GatewayError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `Url::join` appends below any path
        // prefix instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GatewayError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs exactly one upstream call and returns its status and JSON body.
    ///
    /// `raw_query` is appended verbatim, so parameter order and encoding are
    /// whatever the caller sent. Non-2xx statuses are not errors here.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Http`] on network failure or timeout.
    /// - [`GatewayError::Deserialize`] if the body is not JSON.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        raw_query: Option<&str>,
    ) -> Result<UpstreamResponse, GatewayError> {
        let mut url = self.endpoint(path)?;
        url.set_query(raw_query.filter(|q| !q.is_empty()));

        let response = self
            .client
            .request(method, url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).map_err(|e| GatewayError::Deserialize {
            context: url.to_string(),
            source: e,
        })?;

        Ok(UpstreamResponse { status, body })
    }

    /// Fetches one page of posts.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Http`] on network failure.
    /// - [`GatewayError::UnexpectedStatus`] on a non-2xx status.
    /// - [`GatewayError::Deserialize`] if the body does not match [`PostPage`].
    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, GatewayError> {
        let mut url = self.endpoint("api/posts")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query.query_pairs() {
                pairs.append_pair(k, &v);
            }
        }
        self.request_json(Method::GET, url, "list_posts").await
    }

    /// Fetches the aggregate post counts.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::list_posts`].
    pub async fn stats(&self) -> Result<Stats, GatewayError> {
        let url = self.endpoint("api/posts/stats")?;
        self.request_json(Method::GET, url, "stats").await
    }

    /// Fetches the category list with per-category post counts.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::list_posts`].
    pub async fn categories(&self) -> Result<Vec<Category>, GatewayError> {
        let url = self.endpoint("api/posts/categories")?;
        self.request_json(Method::GET, url, "categories").await
    }

    /// Fetches a single post by its board post id.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::list_posts`]; an unknown id surfaces as
    /// [`GatewayError::UnexpectedStatus`] with status 404.
    pub async fn get_post(&self, post_id: &str) -> Result<Post, GatewayError> {
        let mut url = self.endpoint("api/posts")?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .push(post_id);
        self.request_json(Method::GET, url, "get_post").await
    }

    /// Fetches the ranked trending keywords.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::list_posts`].
    pub async fn trending_keywords(&self) -> Result<Vec<Keyword>, GatewayError> {
        let url = self.endpoint("api/keywords/trending")?;
        let trending: TrendingKeywords =
            self.request_json(Method::GET, url, "trending_keywords").await?;
        Ok(trending.keywords)
    }

    /// Triggers one crawl run and returns the backend's report.
    ///
    /// A crawl that ran but failed comes back as `Ok` with `success: false`;
    /// only transport, status and body errors are `Err`.
    ///
    /// # Errors
    ///
    /// See [`GatewayClient::list_posts`].
    pub async fn run_crawler(&self) -> Result<CrawlOutcome, GatewayError> {
        let url = self.endpoint("api/crawler/run")?;
        self.request_json(Method::POST, url, "run_crawler").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends the request, asserts a 2xx status, and decodes the JSON body.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        context: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .request(method, url.clone())
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %url, "gateway returned non-success status");
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Deserialize {
            context: format!("{context} ({url})"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
