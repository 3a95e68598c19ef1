//! HTTP adapter: serves the relay over a plain `axum` listener.
//!
//! Every path and method maps to one invocation; the inbound request is
//! converted to an [`InvocationRequest`] and the [`InvocationResponse`] is
//! written back verbatim.
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::feed::Relay;
use crate::handler::{handle, InvocationRequest, InvocationResponse};

/// Builds a router that answers every request by running the relay.
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new().fallback(invoke).with_state(relay)
}

/// Binds `addr` and serves [`router`] until the process exits.
pub async fn serve(relay: Arc<Relay>, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, feed = %relay.feed_url(), "Listening");
    axum::serve(listener, router(relay)).await
}

async fn invoke(
    State(relay): State<Arc<Relay>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InvocationRequest {
        http_method: Some(method.to_string()),
        path: Some(uri.path().to_string()),
        headers: Some(flatten_headers(&headers)),
        body: (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned()),
    };

    into_http(handle(&relay, &request).await)
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn into_http(response: InvocationResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping response header that is not valid HTTP"),
        }
    }

    (status, headers, Body::from(response.body)).into_response()
}
