//! # HTTP Retrieval Utilities
//!
//! An asynchronous API client wrapper around `reqwest`, with middleware-based
//! exponential backoff for transient failures and standardized JSON handling.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Retries on transient failures unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything that can fail in a request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The base URL or a joined path is not a valid absolute URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// Connection, timeout or retry-exhaustion failure.
    #[error("request failed: {0}")]
    Network(#[from] reqwest_middleware::Error),

    /// The response body could not be read or decoded.
    #[error("failed to read response: {0}")]
    Body(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("http {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Error body, possibly empty.
        body: String,
    },
}

/// Base-URL-relative HTTP client with optional bearer auth and retries.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: Url,
    auth_token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Client with the default retry budget.
    ///
    /// # Errors
    /// Fails when `base_url` is not an absolute URL.
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self, FetchError> {
        Self::with_max_retries(base_url, auth_token, DEFAULT_MAX_RETRIES)
    }

    /// Client retrying transient failures up to `max_retries` times with
    /// exponential backoff. Zero disables the retry middleware.
    ///
    /// # Errors
    /// Fails when `base_url` is not an absolute URL or the TLS backend cannot
    /// be initialised.
    pub fn with_max_retries(
        base_url: &str,
        auth_token: Option<String>,
        max_retries: u32,
    ) -> Result<Self, FetchError> {
        // Url::join replaces the last segment unless the base ends with '/'.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut builder = ClientBuilder::new(client);
        if max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            inner: builder.build(),
            base_url,
            auth_token,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build(&self, method: Method, path: &str) -> Result<reqwest_middleware::RequestBuilder, FetchError> {
        let full_url = self.base_url.join(path.trim_start_matches('/'))?;
        let mut req = self.inner.request(method, full_url);
        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(req)
    }

    /// `GET path` returning the raw body of a 2xx answer.
    ///
    /// # Errors
    /// Network failures and non-2xx statuses.
    pub async fn get_text(&self, path: &str) -> Result<String, FetchError> {
        let response = self.build(Method::GET, path)?.send().await?;
        success(response, path).await?.text().await.map_err(FetchError::Body)
    }

    /// `POST path` with a JSON body, decoding a JSON answer.
    ///
    /// # Errors
    /// URL joining, body encoding, network failures, non-2xx statuses and
    /// undecodable 2xx bodies.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let json_body = serde_json::to_string(body)?;
        let response = self
            .build(Method::POST, path)?
            .header(CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await?;
        success(response, path)
            .await?
            .json::<T>()
            .await
            .map_err(FetchError::Body)
    }
}

/// Passes a 2xx response through and turns anything else into
/// [`FetchError::Status`] carrying the error body.
async fn success(response: reqwest::Response, path: &str) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    log::debug!("HTTP {} from {}", status, path);
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}
