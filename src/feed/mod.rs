//! The feed relay pipeline: fetch, decode, stamp, encode.
//!
//! - **Fetching**: a single HTTP GET with optional size and time limits
//! - **Decoding**: RSS 2.0 `rss > channel > item` via a `quick-xml` event reader
//! - **Encoding**: indented XML via `quick-xml` serde
//! - **Stamping**: every item gets a fresh v4 UUID as its `guid`
//!
//! # Architecture
//!
//! - [`model`] - The `Feed`/`Channel`/`Item` schema
//! - [`fetcher`] - HTTP retrieval
//! - [`codec`] - XML decode and indented encode
//! - [`transform`] - guid stamping
//! - [`pipeline`] - [`Relay`], which composes the stages above
//!
//! Nothing in this module knows about the invocation boundary; see
//! [`crate::handler`] for that.
//!
//! # Example
//!
//! ```ignore
//! use feedstamp::config::Config;
//! use feedstamp::feed::Relay;
//!
//! let relay = Relay::new(&Config::default());
//! let xml = relay.run().await?;
//! ```

mod codec;
mod fetcher;
mod model;
mod pipeline;
mod transform;

pub use codec::{decode, encode, ParseError, SerializeError};
pub use fetcher::{fetch_feed, FetchError, FetchLimits};
pub use model::{Channel, Feed, Item};
pub use pipeline::{Relay, RelayError};
pub use transform::stamp_guids;
