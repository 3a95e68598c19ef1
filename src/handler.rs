//! Invocation boundary: request in, status/headers/body out.
//!
//! These types mirror a function-as-a-service HTTP event (`statusCode`,
//! `headers`, `body`) so the relay can be driven by any host that speaks
//! that shape. The pipeline itself never sees them.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::feed::Relay;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

/// An inbound invocation. The relay does not inspect any of these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationRequest {
    pub http_method: Option<String>,
    pub path: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub body: Option<String>,
}

/// The result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl InvocationResponse {
    /// 200 with the RSS content type.
    pub fn rss(body: String) -> Self {
        Self {
            status_code: 200,
            headers: HashMap::from([("Content-Type".to_string(), RSS_CONTENT_TYPE.to_string())]),
            body,
        }
    }

    /// 500 with the error text as a plain body and no headers.
    pub fn server_error(message: String) -> Self {
        Self {
            status_code: 500,
            headers: HashMap::new(),
            body: message,
        }
    }
}

/// Runs the relay once and shapes the outcome as an [`InvocationResponse`].
pub async fn handle(relay: &Relay, _request: &InvocationRequest) -> InvocationResponse {
    match relay.run().await {
        Ok(xml) => InvocationResponse::rss(xml),
        Err(e) => {
            tracing::warn!(feed = %relay.feed_url(), error = %e, "Feed relay failed");
            InvocationResponse::server_error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HELLO_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Blog</title>
  <item>
    <title>Hello</title>
    <pubDate>Tue, 31 October 2023 10:00:00 +0000</pubDate>
    <guid>old-123</guid>
  </item>
</channel></rss>"#;

    fn relay_at(url: String) -> Relay {
        Relay::new(&Config {
            feed_url: url,
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_handle_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HELLO_RSS))
            .mount(&mock_server)
            .await;

        let relay = relay_at(format!("{}/feed", mock_server.uri()));
        let response = handle(&relay, &InvocationRequest::default()).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers.len(), 1);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some(RSS_CONTENT_TYPE)
        );
        assert!(response.body.contains("<title>Hello</title>"));
        assert!(response
            .body
            .contains("<pubDate>Tue, 31 October 2023 10:00:00 +0000</pubDate>"));
        assert!(!response.body.contains("old-123"));
    }

    #[tokio::test]
    async fn test_handle_parse_failure_is_500() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html><body>Bad Gateway</body></html>"))
            .mount(&mock_server)
            .await;

        let relay = relay_at(format!("{}/feed", mock_server.uri()));
        let response = handle(&relay, &InvocationRequest::default()).await;

        assert_eq!(response.status_code, 500);
        assert!(response.headers.is_empty());
        assert!(response.body.starts_with("Parse error"));
    }

    #[test]
    fn test_response_json_shape() {
        let response = InvocationResponse::server_error("boom".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "statusCode": 500, "headers": {}, "body": "boom" })
        );
    }

    #[test]
    fn test_request_accepts_gateway_event() {
        let event = r#"{
            "httpMethod": "GET",
            "path": "/rss",
            "headers": { "Accept": "*/*" },
            "requestContext": { "stage": "prod" }
        }"#;
        let request: InvocationRequest = serde_json::from_str(event).unwrap();
        assert_eq!(request.http_method.as_deref(), Some("GET"));
        assert_eq!(request.path.as_deref(), Some("/rss"));
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_request_accepts_null_fields() {
        let request: InvocationRequest =
            serde_json::from_str(r#"{ "headers": null, "body": null }"#).unwrap();
        assert_eq!(request.headers, None);
    }

    #[test]
    fn test_request_accepts_empty_object() {
        let request: InvocationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, InvocationRequest::default());
    }
}
