//! Upstream tile provider abstraction
//!
//! This module holds everything needed to turn a [`TileKey`](crate::tile::TileKey)
//! into an upstream HTTP request: per-provider configuration with compiled
//! URL templates, the immutable [`UpstreamRegistry`], and the
//! [`AsyncHttpClient`] seam over reqwest.
//!
//! ```ignore
//! use tileproxy::provider::{ProviderConfig, ReqwestClient, UpstreamRegistry, UrlTemplate};
//!
//! let template = UrlTemplate::parse("https://tile.openstreetmap.org/{z}/{x}/{y}.png")?;
//! let registry = UpstreamRegistry::new([ProviderConfig::new("osm", template)]);
//! let client = ReqwestClient::new()?;
//! ```

mod config;
mod http;
mod registry;
mod types;

pub use config::{BackoffKind, ProviderConfig, TemplateError, UrlTemplate};
pub use http::{AsyncHttpClient, ReqwestClient};
pub use registry::UpstreamRegistry;
pub use types::{ProviderError, UpstreamResponse};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
