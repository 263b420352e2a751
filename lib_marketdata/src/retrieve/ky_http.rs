//! # HTTP Retrieval Utilities
//!
//! This module provides the single fetch path used by every market-data call
//! site: one asynchronous GET built on `reqwest`, a 2xx check, and a JSON
//! decode of the body into a `serde_json::Value`.
//!
//! Request arguments travel in a [`FetchRequest`] rather than as loose
//! parameters, so the endpoint, the ordered query pairs, extra headers and an
//! optional timeout are all explicit. No timeout is applied unless the caller
//! sets one.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Everything that can go wrong while fetching a JSON document.
///
/// `Status` and `Decode` are the two outcomes of a completed exchange. The
/// remaining variants cover requests that could not be built or sent.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint is not an absolute URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// A header name or value could not be encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Connection, TLS, timeout or body-read failure reported by `reqwest`.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status outside 200..=299.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// The numeric HTTP status code.
        status: u16,
        /// The response body as text, exactly as the server sent it.
        body: String,
    },

    /// The server answered 2xx but the body is not valid JSON.
    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Returns the HTTP status code for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the server answered with a non-2xx status.
    pub fn is_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }

    /// `true` when a 2xx body failed to decode as JSON.
    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }

    /// `true` when the request was aborted by its timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport(e) if e.is_timeout())
    }
}

/// The arguments of a single GET request.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Absolute URL of the endpoint. Any query string already present is kept.
    pub endpoint: String,
    /// Query parameters appended after the endpoint's own, in this order.
    pub query: Vec<(String, String)>,
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Per-request timeout. `None` leaves the client default in place.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    /// Starts a request for `endpoint` with no parameters.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Appends one query parameter. Repeated keys are kept.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends several query parameters, preserving iteration order.
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds a header, validating both name and value.
    ///
    /// # Errors
    /// Returns [`FetchError::InvalidHeader`] if either part is not a legal
    /// HTTP header token.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, FetchError> {
        let h_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::InvalidHeader(format!("{}: {}", name, e)))?;
        let h_value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::InvalidHeader(format!("{}: {}", name, e)))?;
        self.headers.append(h_name, h_value);
        Ok(self)
    }

    /// Merges a prebuilt header map into the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets a timeout covering the whole exchange, body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolves the final URL: the parsed endpoint followed by the query pairs.
    ///
    /// # Errors
    /// Returns [`FetchError::InvalidEndpoint`] when the endpoint is not an
    /// absolute URL.
    pub fn url(&self) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.endpoint)?;
        // query_pairs_mut() always leaves a '?' behind, even with nothing to add
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

/// A reusable asynchronous HTTP client.
///
/// Holding one `ApiClient` lets many fetches share a connection pool. It keeps
/// no per-request state: every call to [`ApiClient::get_json`] is independent.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying `reqwest` client.
    inner: reqwest::Client,
}

impl ApiClient {
    /// Creates a client with `reqwest` defaults.
    ///
    /// # Errors
    /// Returns [`FetchError::Transport`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            inner: reqwest::Client::builder().build()?,
        })
    }

    /// Creates a client that sends `user_agent` with every request.
    ///
    /// # Errors
    /// Returns [`FetchError::Transport`] if the client cannot be built.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, FetchError> {
        Ok(Self {
            inner: reqwest::Client::builder().user_agent(user_agent).build()?,
        })
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Performs one GET and returns the decoded JSON body.
    ///
    /// The status check happens before decoding, so a non-2xx response is
    /// always reported as [`FetchError::Status`] whatever its body contains.
    ///
    /// # Errors
    /// See [`FetchError`]. Nothing is retried.
    pub async fn get_json(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let url = request.url()?;
        // Query strings may carry API keys, so only origin and path are logged.
        let origin = url.origin().ascii_serialization();
        let path = url.path().to_string();

        let mut req = self.inner.get(url).headers(request.headers.clone());
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        debug!(%origin, %path, "dispatching GET");
        let started = Instant::now();
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            // A body that cannot be read is a transport failure, not an empty body.
            let body = response.text().await?;
            warn!(%origin, %path, status = status.as_u16(), "upstream returned non-success status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                debug!(
                    %origin,
                    %path,
                    status = status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "GET succeeded"
                );
                Ok(value)
            }
            Err(e) => {
                warn!(%origin, %path, bytes = bytes.len(), error = %e, "response body is not valid JSON");
                Err(FetchError::Decode(e))
            }
        }
    }
}

/// Fetches `request.endpoint` with a fresh client and returns the decoded body.
///
/// This is the one implementation behind every provider name in
/// `crate::markets`.
///
/// # Errors
/// See [`FetchError`].
pub async fn fetch_json(request: &FetchRequest) -> Result<Value, FetchError> {
    ApiClient::new()?.get_json(request).await
}
