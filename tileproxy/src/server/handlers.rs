//! Route handlers.

use axum::extract::{Path, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::debug;

use super::error::ApiError;
use crate::cache::CacheStats;
use crate::fetch::{FetchCoordinator, Resolved, DEFAULT_CONTENT_TYPE};
use crate::provider::AsyncHttpClient;
use crate::telemetry::TelemetrySnapshot;
use crate::tile::TileKey;

/// Response header reporting how the tile was served.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// `GET /tiles/:provider/:z/:x/:y`
pub async fn get_tile<C: AsyncHttpClient>(
    State(coordinator): State<FetchCoordinator<C>>,
    Path((provider, z, x, y)): Path<(String, String, String, String)>,
) -> Response {
    let key = match TileKey::from_parts(&provider, &z, &x, &y) {
        Ok(key) => key,
        Err(e) => {
            debug!(provider = %provider, z = %z, x = %x, y = %y, error = %e, "Malformed tile request");
            return ApiError::from(&e).into_response();
        }
    };

    match coordinator.resolve_with_source(&key).await {
        Ok(resolved) => tile_response(resolved),
        Err(e) => {
            debug!(tile = %key, error = %e, "Tile request failed");
            ApiError::from(&e).into_response()
        }
    }
}

fn tile_response(resolved: Resolved) -> Response {
    let Resolved { entry, source } = resolved;
    let content_type = HeaderValue::from_str(&entry.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let cache_control = format!("public, max-age={}", entry.remaining_ttl().as_secs());

    let mut response = (StatusCode::OK, entry.bytes.clone()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(X_CACHE, HeaderValue::from_static(source.as_str()));
    response
}

#[derive(Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub service: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        service: crate::SERVICE_NAME,
    })
}

#[derive(Serialize)]
pub struct InfoBody {
    pub service: &'static str,
    pub version: &'static str,
    pub usage: &'static str,
    pub providers: Vec<String>,
}

/// `GET /`
pub async fn info<C: AsyncHttpClient>(
    State(coordinator): State<FetchCoordinator<C>>,
) -> Json<InfoBody> {
    Json(InfoBody {
        service: crate::SERVICE_NAME,
        version: crate::VERSION,
        usage: "/tiles/{provider}/{z}/{x}/{y}.png",
        providers: coordinator
            .registry()
            .ids()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

#[derive(Serialize)]
pub struct StatsBody {
    pub telemetry: TelemetrySnapshot,
    pub cache: CacheStats,
    pub negative_entries: u64,
    pub in_flight: usize,
}

/// `GET /stats`
pub async fn stats<C: AsyncHttpClient>(
    State(coordinator): State<FetchCoordinator<C>>,
) -> Json<StatsBody> {
    Json(StatsBody {
        telemetry: coordinator.metrics().snapshot(),
        cache: coordinator.cache().stats(),
        negative_entries: coordinator.negative_cache().len(),
        in_flight: coordinator.in_flight(),
    })
}
