// src/source/twitter/mod.rs
//! Live source backed by the Twitter v1.1 search API.

pub mod translate;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::OAuthCredentials;
use crate::error::{PipelineError, Result};
use crate::source::result::QueryResult;
use crate::source::types::SocialQuery;
use crate::source::SocialSource;
use crate::telemetry::ensure_metrics_described;

pub use translate::SOURCE_NAME;
use translate::{to_provider_query, translate_messages, translate_query};
use wire::{SearchResponse, TwitterQuery};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Seam around the provider client so the adapter can run against a fake.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &TwitterQuery) -> Result<SearchResponse>;
    fn set_oauth_consumer(&mut self, key: &str, secret: &str);
    /// Stores the user token pair. Search runs with app-only bearer auth, so
    /// the pair is kept for callers but never sent with a search request.
    fn set_oauth_access_token(&mut self, token: &str, token_secret: &str);
}

/// `LiveSource`: applies the canonical query to the provider query object,
/// dispatches one request, translates the page.
pub struct TwitterSource<A: SearchApi = HttpTwitterApi> {
    api: A,
}

impl<A: SearchApi> TwitterSource<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

impl TwitterSource<HttpTwitterApi> {
    pub fn from_credentials(credentials: OAuthCredentials) -> Result<Self> {
        Ok(Self::new(HttpTwitterApi::new(credentials)?))
    }
}

#[async_trait]
impl<A: SearchApi> SocialSource for TwitterSource<A> {
    async fn search(&self, query: &SocialQuery) -> Result<QueryResult> {
        ensure_metrics_described();

        if query.query.trim().is_empty() {
            return Err(PipelineError::provider(
                SOURCE_NAME,
                "query text must not be empty",
            ));
        }

        let provider_query = to_provider_query(query);
        counter!("source_search_total", "source" => SOURCE_NAME).increment(1);

        let response = match self.api.search(&provider_query).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, provider = SOURCE_NAME, "provider search error");
                counter!("source_provider_errors_total", "source" => SOURCE_NAME).increment(1);
                return Err(e);
            }
        };

        let messages = translate_messages(response.statuses.as_deref());
        counter!("source_messages_total", "source" => SOURCE_NAME)
            .increment(messages.len() as u64);

        let next = response
            .next_query(&provider_query)
            .map(|q| translate_query(&q));
        tracing::debug!(
            provider = SOURCE_NAME,
            messages = messages.len(),
            has_next = next.is_some(),
            "search page"
        );

        Ok(QueryResult::page(
            messages,
            response.search_metadata.query.clone(),
            query,
            next,
        ))
    }

    fn set_credential(&mut self, key: &str, secret: &str) {
        self.api.set_oauth_consumer(key, secret);
    }

    fn set_access_token(&mut self, token: &str, token_secret: &str) {
        self.api.set_oauth_access_token(token, token_secret);
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

/// HTTP client for the search endpoint. Authenticates with an
/// application-only bearer token derived from the consumer key/secret.
pub struct HttpTwitterApi {
    http: reqwest::Client,
    base_url: String,
    credentials: OAuthCredentials,
    bearer: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

impl HttpTwitterApi {
    pub fn new(credentials: OAuthCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("social-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| PipelineError::provider(SOURCE_NAME, format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
            bearer: Mutex::new(None),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credentials(&self) -> &OAuthCredentials {
        &self.credentials
    }

    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.bearer.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        if !self.credentials.has_consumer() {
            return Err(PipelineError::provider(
                SOURCE_NAME,
                "consumer key/secret not configured",
            ));
        }

        let resp = self
            .http
            .post(format!("{}/oauth2/token", self.base_url))
            .basic_auth(
                &self.credentials.consumer_key,
                Some(&self.credentials.consumer_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PipelineError::provider(SOURCE_NAME, format!("token request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::provider(
                SOURCE_NAME,
                format!("token request rejected (status {}): {body}", status.as_u16()),
            ));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::provider(SOURCE_NAME, format!("token response: {e}")))?;
        if !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(PipelineError::provider(
                SOURCE_NAME,
                format!("unexpected token type {:?}", token.token_type),
            ));
        }

        *cached = Some(token.access_token.clone());
        Ok(token.access_token)
    }
}

#[async_trait]
impl SearchApi for HttpTwitterApi {
    async fn search(&self, query: &TwitterQuery) -> Result<SearchResponse> {
        let token = self.bearer_token().await?;
        let resp = self
            .http
            .get(format!("{}/1.1/search/tweets.json", self.base_url))
            .bearer_auth(&token)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| PipelineError::provider(SOURCE_NAME, format!("search request: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Token revoked or expired; fetch a fresh one on the next call.
            self.bearer.lock().await.take();
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::provider(
                SOURCE_NAME,
                format!("search failed (status {}): {body}", status.as_u16()),
            ));
        }

        resp.json()
            .await
            .map_err(|e| PipelineError::provider(SOURCE_NAME, format!("search response: {e}")))
    }

    fn set_oauth_consumer(&mut self, key: &str, secret: &str) {
        self.credentials.consumer_key = key.to_string();
        self.credentials.consumer_secret = secret.to_string();
        *self.bearer.get_mut() = None;
    }

    fn set_oauth_access_token(&mut self, token: &str, token_secret: &str) {
        self.credentials.access_token = token.to_string();
        self.credentials.access_token_secret = token_secret.to_string();
    }
}
