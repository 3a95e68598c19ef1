//! feedstamp: fetch one RSS feed, give every item a fresh guid, re-serve it.
//!
//! - [`feed`] - The fetch → decode → stamp → encode pipeline
//! - [`config`] - TOML configuration with env/CLI overrides
//! - [`handler`] - Invocation request/response boundary
//! - [`server`] - `axum` adapter for the invocation boundary

pub mod config;
pub mod feed;
pub mod handler;
pub mod server;
