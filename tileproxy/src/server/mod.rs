//! HTTP surface of the proxy.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /tiles/:provider/:z/:x/:y` | tile bytes, `y` may carry an extension |
//! | `GET /health` | `{"status":"ok"}` |
//! | `GET /` | service name, version, providers |
//! | `GET /stats` | counters and cache statistics |

mod error;
mod handlers;

use axum::routing::get;
use axum::Router;

use crate::fetch::FetchCoordinator;
use crate::provider::AsyncHttpClient;

pub use error::ApiError;
pub use handlers::X_CACHE;

/// Build the router serving tiles through `coordinator`.
pub fn create_router<C: AsyncHttpClient>(coordinator: FetchCoordinator<C>) -> Router {
    Router::new()
        .route("/", get(handlers::info::<C>))
        .route("/health", get(handlers::health))
        .route("/stats", get(handlers::stats::<C>))
        .route("/tiles/:provider/:z/:x/:y", get(handlers::get_tile::<C>))
        .with_state(coordinator)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{CacheCapacity, NegativeCache, TileCacheStore};
    use crate::provider::{
        MockAsyncHttpClient, ProviderConfig, UpstreamRegistry, UpstreamResponse, UrlTemplate,
    };
    use crate::telemetry::ProxyMetrics;

    fn router(client: MockAsyncHttpClient) -> (Router, Arc<MockAsyncHttpClient>) {
        let template = UrlTemplate::parse("https://tiles.example/{z}/{x}/{y}.png").unwrap();
        let provider =
            ProviderConfig::new("osm", template).with_retries(0, Duration::from_millis(1));
        let client = Arc::new(client);
        let coordinator = FetchCoordinator::new(
            Arc::new(UpstreamRegistry::new([provider])),
            Arc::new(TileCacheStore::new(CacheCapacity::Entries(16))),
            Arc::new(NegativeCache::new(Duration::from_secs(60), 16)),
            Arc::clone(&client),
            Arc::new(ProxyMetrics::new()),
            Duration::from_secs(3600),
        );
        (create_router(coordinator), client)
    }

    async fn get_uri(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_tile_miss_then_hit() {
        let (router, client) = router(MockAsyncHttpClient::ok(b"png-bytes"));

        let response = get_uri(router.clone(), "/tiles/osm/3/1/2.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[X_CACHE], "MISS");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let cache_control = response.headers()[header::CACHE_CONTROL].to_str().unwrap();
        assert!(cache_control.starts_with("public, max-age="));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"png-bytes");

        let response = get_uri(router, "/tiles/osm/3/1/2").await;
        assert_eq!(response.headers()[X_CACHE], "HIT");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_coordinates() {
        let (router, client) = router(MockAsyncHttpClient::ok(b"x"));

        for uri in ["/tiles/osm/3/8/0", "/tiles/osm/abc/1/2", "/tiles/osm/31/0/0"] {
            let response = get_uri(router.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json_body(response).await["error"], "malformed_tile");
        }
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let (router, _) = router(MockAsyncHttpClient::ok(b"x"));

        let response = get_uri(router, "/tiles/nope/1/0/0").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"], "unknown_provider");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (router, _) = router(MockAsyncHttpClient::new(Ok(UpstreamResponse::new(
            404,
            Vec::new(),
        ))));

        let response = get_uri(router, "/tiles/osm/1/0/0").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "tile_not_found");
    }

    #[tokio::test]
    async fn test_upstream_errors_hide_details() {
        let (router, _) = router(MockAsyncHttpClient::new(Ok(UpstreamResponse::new(
            503,
            Vec::new(),
        ))));

        let response = get_uri(router, "/tiles/osm/1/0/0").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = json_body(response).await;
        assert_eq!(body["error"], "upstream_unavailable");
        let message = body["message"].as_str().unwrap();
        assert!(!message.contains("tiles.example"));
        assert!(!message.contains("attempt"));
    }

    #[tokio::test]
    async fn test_upstream_rejected() {
        let (router, _) = router(MockAsyncHttpClient::new(Ok(UpstreamResponse::new(
            403,
            Vec::new(),
        ))));

        let response = get_uri(router, "/tiles/osm/1/0/0").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"], "upstream_rejected");
    }

    #[tokio::test]
    async fn test_health_info_stats() {
        let (router, _) = router(MockAsyncHttpClient::ok(b"x"));

        let health = json_body(get_uri(router.clone(), "/health").await).await;
        assert_eq!(health["status"], "ok");

        let info = json_body(get_uri(router.clone(), "/").await).await;
        assert_eq!(info["providers"], serde_json::json!(["osm"]));
        assert_eq!(info["version"], crate::VERSION);

        get_uri(router.clone(), "/tiles/osm/0/0/0").await;
        let stats = json_body(get_uri(router, "/stats").await).await;
        assert_eq!(stats["telemetry"]["requests"], 1);
        assert_eq!(stats["cache"]["entry_count"], 1);
        assert_eq!(stats["in_flight"], 0);
    }
}
