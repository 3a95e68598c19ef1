use serde::Serialize;

/// A parsed RSS document: the `<rss>` root and its single `<channel>`.
///
/// Only the fields this crate relays are modelled. Anything else in the
/// source document (namespaced extensions, `<image>`, `<category>`, ...) is
/// skipped by [`decode`](super::decode). The serde mapping below is the
/// encoded layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Feed {
    /// The root `version` attribute, carried through untouched.
    #[serde(rename = "@version")]
    pub version: String,
    pub channel: Channel,
}

/// Channel metadata plus its items in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "item")]
    pub items: Vec<Item>,
}

/// A single feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Publication date exactly as the source wrote it. Never parsed.
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    /// Replaced on every pass through [`stamp_guids`](super::stamp_guids).
    pub guid: String,
}
