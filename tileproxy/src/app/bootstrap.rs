//! Application bootstrap implementation.
//!
//! `TileProxyApp` wires the pieces together in dependency order: providers,
//! caches, HTTP client, coordinator, router.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::error::AppError;
use crate::cache::{NegativeCache, TileCacheStore};
use crate::config::{load_registry, ProxyConfig};
use crate::fetch::FetchCoordinator;
use crate::provider::{AsyncHttpClient, ReqwestClient};
use crate::server::create_router;
use crate::telemetry::ProxyMetrics;

/// A configured tile proxy, ready to serve.
///
/// # Example
///
/// ```ignore
/// use tileproxy::app::TileProxyApp;
/// use tileproxy::config::ProxyConfig;
/// use tokio_util::sync::CancellationToken;
///
/// let app = TileProxyApp::start(ProxyConfig::new("providers.json"))?;
/// let shutdown = CancellationToken::new();
/// app.serve(shutdown).await?;
/// ```
pub struct TileProxyApp<C: AsyncHttpClient = ReqwestClient> {
    config: ProxyConfig,
    coordinator: FetchCoordinator<C>,
}

impl TileProxyApp<ReqwestClient> {
    /// Build the proxy with the production HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the configuration or the provider
    /// description is invalid, and [`AppError::HttpClient`] if the client
    /// cannot be built.
    pub fn start(config: ProxyConfig) -> Result<Self, AppError> {
        let client = ReqwestClient::new()?;
        Self::start_with_client(config, client)
    }
}

impl<C: AsyncHttpClient> TileProxyApp<C> {
    /// Build the proxy around a caller-supplied HTTP client.
    pub fn start_with_client(config: ProxyConfig, client: C) -> Result<Self, AppError> {
        config.validate()?;
        let registry = load_registry(&config.providers_path)?;
        info!(
            providers = registry.len(),
            path = %config.providers_path.display(),
            "Loaded provider descriptions"
        );

        let cache = TileCacheStore::new(config.cache_capacity);
        let negative = NegativeCache::new(config.negative_ttl, config.negative_capacity);
        info!(
            capacity = %config.cache_capacity,
            default_ttl_secs = config.default_ttl.as_secs(),
            negative_ttl_secs = config.negative_ttl.as_secs(),
            "Tile cache ready"
        );

        let coordinator = FetchCoordinator::new(
            Arc::new(registry),
            Arc::new(cache),
            Arc::new(negative),
            Arc::new(client),
            Arc::new(ProxyMetrics::new()),
            config.default_ttl,
        );

        Ok(Self {
            config,
            coordinator,
        })
    }

    /// The configuration the proxy was started with.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The coordinator serving tiles.
    pub fn coordinator(&self) -> &FetchCoordinator<C> {
        &self.coordinator
    }

    /// Router for the HTTP surface.
    pub fn router(&self) -> Router {
        create_router(self.coordinator.clone())
    }

    /// Bind the configured address and serve until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), AppError> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), AppError> {
        let local_addr = listener.local_addr().map_err(AppError::Serve)?;
        info!(addr = %local_addr, "Tile proxy listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("Shutdown requested, draining connections");
            })
            .await
            .map_err(AppError::Serve)?;

        let stats = self.coordinator.metrics().snapshot();
        info!(
            requests = stats.requests,
            upstream_requests = stats.upstream_requests,
            hit_rate = %format!("{:.1}%", stats.hit_rate() * 100.0),
            "Tile proxy stopped"
        );
        Ok(())
    }
}
