//! Semantic-convention names and mapping rules for HTTP server telemetry.
//!
//! Attribute keys follow the stable `http.*` conventions so that spans and
//! metrics emitted here aggregate with other instrumentations reporting the
//! same dimensions.

use axum::http::{StatusCode, Version};
use opentelemetry::trace::Status;

/// Instrumentation scope under which all spans and instruments are created.
pub const INSTRUMENTATION_NAME: &str = "axum-otel-http";

// Metric instrument names.
pub const METRIC_HTTP_SERVER_DURATION: &str = "http.server.duration";
pub const METRIC_HTTP_SERVER_REQUEST_SIZE: &str = "http.server.request.size";
pub const METRIC_HTTP_SERVER_RESPONSE_SIZE: &str = "http.server.response.size";
pub const METRIC_HTTP_SERVER_ACTIVE_REQUESTS: &str = "http.server.active_requests";

// Metric units.
pub const UNIT_DIMENSIONLESS: &str = "1";
pub const UNIT_BYTES: &str = "By";
pub const UNIT_MILLISECONDS: &str = "ms";

// Request-phase attribute keys.
pub const HTTP_METHOD: &str = "http.method";
pub const HTTP_SCHEME: &str = "http.scheme";
pub const HTTP_HOST: &str = "http.host";
pub const HTTP_TARGET: &str = "http.target";
pub const HTTP_FLAVOR: &str = "http.flavor";
pub const HTTP_CLIENT_IP: &str = "http.client_ip";

// Response-phase attribute keys.
pub const HTTP_STATUS_CODE: &str = "http.status_code";
pub const HTTP_ROUTE: &str = "http.route";
pub const HTTP_RESPONSE_CONTENT_LENGTH: &str = "http.response_content_length";

/// Maps a response status code to a span status for server-kind spans.
///
/// Only 5xx responses mark the span as failed; client errors (4xx) are not
/// server faults and leave the status unset.
pub fn span_status_from_http(status: StatusCode) -> Status {
    if status.is_server_error() {
        Status::error(status.canonical_reason().unwrap_or("server error"))
    } else {
        Status::Unset
    }
}

/// Returns the `http.flavor` value for a protocol version, or `None` for a
/// version without a defined convention value; callers omit the tag rather
/// than emit an empty string.
pub fn http_flavor(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_09 => Some("0.9"),
        Version::HTTP_10 => Some("1.0"),
        Version::HTTP_11 => Some("1.1"),
        Version::HTTP_2 => Some("2.0"),
        Version::HTTP_3 => Some("3.0"),
        _ => None,
    }
}
