//! Application bootstrap and lifecycle management.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       TileProxyApp                         │
//! │                                                            │
//! │  providers.json ──► UpstreamRegistry ─┐                    │
//! │  ProxyConfig ─────► TileCacheStore ───┼──► FetchCoordinator│
//! │                     NegativeCache ────┤         │          │
//! │  ReqwestClient ───────────────────────┘         ▼          │
//! │                                            axum Router     │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod error;

pub use bootstrap::TileProxyApp;
pub use error::AppError;
