//! HTTP client abstraction for testability.
//!
//! The pipeline downloads through [`AsyncHttpClient`] rather than a
//! concrete client so tests can inject scripted responses. The real
//! implementation is [`AsyncReqwestClient`].

use std::future::Future;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Transfer-level failures.
///
/// Cloneable so mock clients can replay scripted outcomes.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Body streaming failed mid-transfer
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Trait for asynchronous HTTP downloads.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request, streaming the body.
    ///
    /// `on_chunk` is invoked with the size of each body chunk as it
    /// arrives, before the chunk is appended to the returned buffer, so
    /// callers can account for bytes while the transfer is in flight.
    ///
    /// # Returns
    ///
    /// The complete response body, or an error.
    fn get_streamed(
        &self,
        url: &str,
        on_chunk: &mut (dyn FnMut(usize) + Send),
    ) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Default User-Agent string for HTTP requests.
/// Some artifact CDNs reject requests without a User-Agent.
const DEFAULT_USER_AGENT: &str = concat!("packmule/", env!("CARGO_PKG_VERSION"));

/// Async HTTP client implementation using reqwest.
///
/// Uses non-blocking I/O with a pooled connection set sized for many
/// small artifact downloads running in parallel.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(30)
    }

    /// Creates a new AsyncReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            // Keep connections warm across a batch of downloads
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get_streamed(
        &self,
        url: &str,
        on_chunk: &mut (dyn FnMut(usize) + Send),
    ) -> Result<Vec<u8>, HttpError> {
        trace!(url = url, "HTTP GET request starting");

        let mut response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(HttpError::Request(e.to_string()));
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "HTTP error status"
            );
            return Err(HttpError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    on_chunk(chunk.len());
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(url = url, error = %e, "Failed to read response body");
                    return Err(HttpError::Body(e.to_string()));
                }
            }
        }

        trace!(url = url, bytes = body.len(), "HTTP response body read");
        Ok(body)
    }
}
