//! Experiment bucketing served from a server-rendered page and from an edge-middleware style
//! handler, with experiment definitions distributed through Edge Config.
//!
//! # Overview
//!
//! A [`Client`] evaluates experiments for a [`User`]. Evaluation yields a [`DynamicConfig`], from
//! which individual parameters are read with a fallback. Every evaluation that places the user in a
//! group records an exposure event, which is sent by [`Client::flush`].
//!
//! The client does not read storage itself. It asks a [`DataAdapter`] for the serialized config
//! specs. [`EdgeConfigDataAdapter`] serves them from an Edge Config item through an injected
//! [`EdgeConfigClient`], so the page can render without a round trip to the experimentation API.
//! If the adapter has nothing, the client downloads specs from the API instead (unless running in
//! local mode).
//!
//! The [`handlers`] module wires it together: each request builds a fresh adapter and client,
//! evaluates the `statsig_example` experiment, flushes exposures and renders the page.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Data adapters attach errors to their response
//! instead of returning them, and experiment evaluation never fails: missing configuration
//! serves the fallback value.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with the
//! `edge_experiments` target. The binary installs `env_logger`, configured through `RUST_LOG`.

#![warn(rustdoc::missing_crate_level_docs)]

mod client;
mod config;
mod configuration_store;
mod error;
mod eval;
mod fetcher;
mod sharder;
mod user;

pub mod data_adapter;
pub mod edge_config;
pub mod events;
pub mod handlers;
pub mod page;
pub mod settings;
pub mod specs;

pub use client::{Client, DynamicConfig};
pub use config::ClientConfig;
pub use data_adapter::{AdapterResponse, DataAdapter, EdgeConfigDataAdapter};
pub use edge_config::{EdgeConfigClient, HttpEdgeConfigClient, StaticEdgeConfig};
pub use error::{Error, Result};
pub use settings::Settings;
pub use user::{AttributeValue, User};
