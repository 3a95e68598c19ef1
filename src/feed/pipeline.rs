use thiserror::Error;

use super::codec::{decode, encode, ParseError, SerializeError};
use super::fetcher::{fetch_feed, FetchError, FetchLimits};
use super::model::Feed;
use super::transform::stamp_guids;
use crate::config::Config;

/// Any failure along the fetch → decode → encode pipeline.
///
/// Displays as the underlying stage error, which is what callers put in
/// the response body.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// The feed relay: one configured source, one HTTP client.
///
/// Holds no per-request state, so a single `Relay` can be shared across
/// invocations (each [`run`](Relay::run) builds its own [`Feed`]).
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    feed_url: String,
    limits: FetchLimits,
}

impl Relay {
    /// Builds a relay for the feed named in `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Builds a relay around an existing client.
    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            feed_url: config.feed_url.clone(),
            limits: config.fetch_limits(),
        }
    }

    /// The upstream feed URL this relay fetches.
    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Fetches and decodes the feed, then stamps fresh guids on every item.
    ///
    /// # Errors
    ///
    /// Short-circuits on the first failing stage with
    /// [`RelayError::Fetch`] or [`RelayError::Parse`].
    pub async fn fetch_stamped(&self) -> Result<Feed, RelayError> {
        let bytes = fetch_feed(&self.client, &self.feed_url, self.limits).await?;
        let mut feed = decode(&bytes)?;
        let stamped = stamp_guids(&mut feed);

        tracing::info!(
            feed = %self.feed_url,
            version = %feed.version,
            items = stamped,
            "Stamped fresh guids on feed items"
        );
        Ok(feed)
    }

    /// Runs the whole pipeline and returns the re-encoded XML document.
    pub async fn run(&self) -> Result<String, RelayError> {
        let feed = self.fetch_stamped().await?;
        Ok(encode(&feed)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TWO_ITEMS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Two</title>
    <item><guid>a</guid><title>First</title></item>
    <item><guid>b</guid><title>Second</title></item>
</channel></rss>"#;

    async fn relay_for(body: &str) -> (MockServer, Relay) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let config = Config {
            feed_url: format!("{}/feed", mock_server.uri()),
            ..Config::default()
        };
        (mock_server, Relay::new(&config))
    }

    #[tokio::test]
    async fn test_fetch_stamped_replaces_guids() {
        let (_server, relay) = relay_for(TWO_ITEMS).await;

        let feed = relay.fetch_stamped().await.unwrap();
        let titles: Vec<_> = feed.channel.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(feed.channel.items.iter().all(|i| i.guid != "a" && i.guid != "b"));
        assert_ne!(feed.channel.items[0].guid, feed.channel.items[1].guid);
    }

    #[tokio::test]
    async fn test_run_produces_xml() {
        let (_server, relay) = relay_for(TWO_ITEMS).await;

        let xml = relay.run().await.unwrap();
        assert!(xml.contains("<rss version=\"2.0\">"));
        assert!(xml.contains("<title>Second</title>"));
        assert!(!xml.contains("<guid>a</guid>"));
    }

    #[tokio::test]
    async fn test_run_parse_error_short_circuits() {
        let (_server, relay) = relay_for("<not valid xml").await;

        match relay.run().await {
            Err(RelayError::Parse(_)) => {}
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relay_error_displays_stage_message() {
        let err = RelayError::from(ParseError::MissingRoot);
        assert_eq!(err.to_string(), ParseError::MissingRoot.to_string());
    }
}
