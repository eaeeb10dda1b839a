//! HTTP transport with automatic rate-limit retries.

use crate::config::RetryPolicy;
use crate::error::{NetworkError, NetworkResult};
use crate::executor::with_retry;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client wrapper with automatic retries.
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: Client,
    policy: RetryPolicy,
}

impl Default for RetryClient {
    fn default() -> Self {
        Self::for_api()
    }
}

impl RetryClient {
    /// Create a new retry client with a default reqwest client.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            policy,
        }
    }

    /// Create with a custom reqwest client.
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Create with a request timeout.
    ///
    /// Falls back to a client without timeout if the builder fails.
    pub fn with_timeout(policy: RetryPolicy, timeout: Duration) -> Self {
        let client = match Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(timeout = ?timeout, error = %e, "HTTP client build failed, timeout not applied");
                Client::new()
            }
        };
        Self { client, policy }
    }

    /// Create with default API retry settings.
    pub fn for_api() -> Self {
        Self::new(RetryPolicy::for_api())
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a reference to the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request built fresh for every attempt.
    ///
    /// The builder closure runs once per attempt, so per-request values such as
    /// a random seed differ between retries.
    pub async fn send<F>(&self, build: F) -> NetworkResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let build = &build;
        let client = &self.client;
        with_retry(&self.policy, || async move {
            let response = build(client).send().await.map_err(NetworkError::from)?;
            check_response(response).await
        })
        .await
    }

    /// Execute a GET request with retries.
    pub async fn get(&self, url: &str) -> NetworkResult<Response> {
        debug!(url = %url, "GET");
        self.send(|client| client.get(url)).await
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NetworkResult<T> {
        let response = self.get(url).await?;
        decode_json(response).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> NetworkResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url = %url, "POST");
        let response = self.send(|client| client.post(url).json(body)).await?;
        decode_json(response).await
    }
}

/// Decode a JSON body, mapping failures to [`NetworkError::Decode`].
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> NetworkResult<T> {
    let bytes = response.bytes().await.map_err(NetworkError::from)?;
    serde_json::from_slice(&bytes).map_err(|e| NetworkError::decode(e.to_string()))
}

/// Check an HTTP response and convert failures into [`NetworkError`].
async fn check_response(response: Response) -> NetworkResult<Response> {
    let status = response.status().as_u16();

    if status == 429 {
        return Err(NetworkError::rate_limited());
    }

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NetworkError::Http { status, body });
    }

    Ok(response)
}
