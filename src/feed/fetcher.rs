use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching the upstream feed.
///
/// Every variant is a fetch-stage failure: nothing has been parsed yet.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body stream, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the configured size limit
    #[error("Response too large: limit is {0} bytes")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Transport limits applied to a single fetch.
///
/// `None` leaves the corresponding limit to whatever the HTTP client does
/// by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Option<Duration>,
    pub max_bytes: Option<usize>,
}

/// Issues a single GET to `url` and returns the full response body.
///
/// The HTTP status is not inspected: a 404 or 503 page is returned like any
/// other body and left for the decoder to reject. No retry is attempted.
///
/// The response is owned by this call and dropped on every return path, so
/// the connection goes back to the client's pool (or is closed) whether the
/// body read succeeds or not.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection, TLS, or body stream errors
/// - [`FetchError::Timeout`] - `limits.timeout` elapsed (covers the body read)
/// - [`FetchError::ResponseTooLarge`] - Body exceeded `limits.max_bytes`
/// - [`FetchError::IncompleteResponse`] - Fewer bytes than `Content-Length`
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    limits: FetchLimits,
) -> Result<Vec<u8>, FetchError> {
    let fetch = fetch_body(client, url, limits.max_bytes);

    match limits.timeout {
        Some(timeout) => tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout(timeout))?,
        None => fetch.await,
    }
}

async fn fetch_body(
    client: &reqwest::Client,
    url: &str,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>, FetchError> {
    tracing::debug!(feed = %url, "Fetching feed");

    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(feed = %url, status = %status, "Upstream returned non-success status");
    }

    let bytes = read_limited_bytes(response, max_bytes).await?;
    tracing::debug!(feed = %url, bytes = bytes.len(), "Feed body received");
    Ok(bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: Option<usize>,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let (Some(len), Some(limit)) = (expected_length, limit) {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(limit) = limit {
            if bytes.len().saturating_add(chunk.len()) > limit {
                return Err(FetchError::ResponseTooLarge(limit));
            }
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
