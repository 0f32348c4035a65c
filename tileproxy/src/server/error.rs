//! Mapping of tile failures onto HTTP responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::fetch::{FetchError, FetchErrorKind};
use crate::tile::TileKeyError;

/// An error response with a stable machine-readable code.
///
/// Messages are fixed per code; upstream URLs, retry counts and other
/// internals never reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

impl ApiError {
    pub const MALFORMED: Self = Self {
        status: StatusCode::BAD_REQUEST,
        code: "malformed_tile",
        message: "tile coordinates are malformed or out of range",
    };
    pub const NOT_FOUND: Self = Self {
        status: StatusCode::NOT_FOUND,
        code: "tile_not_found",
        message: "tile does not exist upstream",
    };
    pub const UNKNOWN_PROVIDER: Self = Self {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "unknown_provider",
        message: "no tile provider is configured under this name",
    };
    pub const UPSTREAM_REJECTED: Self = Self {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_rejected",
        message: "upstream provider rejected the request",
    };
    pub const UPSTREAM_UNAVAILABLE: Self = Self {
        status: StatusCode::GATEWAY_TIMEOUT,
        code: "upstream_unavailable",
        message: "upstream provider is unavailable",
    };
    pub const INTERNAL: Self = Self {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal_error",
        message: "internal error while fetching tile",
    };
}

impl From<&FetchError> for ApiError {
    fn from(err: &FetchError) -> Self {
        match err.kind() {
            FetchErrorKind::NotFound => Self::NOT_FOUND,
            FetchErrorKind::UnknownProvider => Self::UNKNOWN_PROVIDER,
            FetchErrorKind::UpstreamRejected => Self::UPSTREAM_REJECTED,
            FetchErrorKind::UpstreamUnavailable => Self::UPSTREAM_UNAVAILABLE,
            FetchErrorKind::Internal => Self::INTERNAL,
        }
    }
}

impl From<&TileKeyError> for ApiError {
    fn from(_: &TileKeyError) -> Self {
        Self::MALFORMED
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        response
    }
}
