//! Pure attribute extraction from requests and responses.
//!
//! Extraction runs in two phases with a fixed concatenation order:
//! request-phase tags are captured and frozen before handler dispatch,
//! response-phase tags are appended afterwards. Given the same request and
//! response the same tag sequence is produced.

use std::net::SocketAddr;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use opentelemetry::KeyValue;

use crate::semconv;

/// Ordered, append-only attribute sequence built in two phases.
///
/// The active-request gauge is tagged with the request-phase prefix only,
/// while the histograms receive the full sequence. Response-phase keys must
/// not repeat a request-phase dimension.
#[derive(Debug, Clone)]
pub(crate) struct AttributeSet {
    attrs: Vec<KeyValue>,
    request_len: usize,
}

impl AttributeSet {
    /// Freezes the request-phase tags captured before dispatch.
    pub(crate) fn from_request_phase(attrs: Vec<KeyValue>) -> Self {
        let request_len = attrs.len();
        Self { attrs, request_len }
    }

    /// Appends the response-phase tags after the handler completed.
    pub(crate) fn append_response_phase(&mut self, attrs: impl IntoIterator<Item = KeyValue>) {
        debug_assert_eq!(
            self.attrs.len(),
            self.request_len,
            "response phase appended twice"
        );
        self.attrs.extend(attrs);
    }

    /// The request-phase prefix.
    pub(crate) fn request_phase(&self) -> &[KeyValue] {
        &self.attrs[..self.request_len]
    }

    /// The response-phase suffix; empty until appended.
    pub(crate) fn response_phase(&self) -> &[KeyValue] {
        &self.attrs[self.request_len..]
    }

    /// The full sequence, request phase first.
    pub(crate) fn all(&self) -> &[KeyValue] {
        &self.attrs
    }
}

/// Extracts the request-phase attributes: method, scheme, host, target,
/// protocol version, and the client address when connection info is
/// available.
pub(crate) fn request_attributes(req: &Request) -> Vec<KeyValue> {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| req.uri().path());

    let mut attrs = vec![
        KeyValue::new(semconv::HTTP_METHOD, req.method().as_str().to_owned()),
        KeyValue::new(
            semconv::HTTP_SCHEME,
            req.uri().scheme_str().unwrap_or("http").to_owned(),
        ),
        KeyValue::new(semconv::HTTP_TARGET, target.to_owned()),
    ];

    if let Some(flavor) = semconv::http_flavor(req.version()) {
        attrs.push(KeyValue::new(semconv::HTTP_FLAVOR, flavor));
    }
    if let Some(host) = request_host(req) {
        attrs.push(KeyValue::new(semconv::HTTP_HOST, host));
    }
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        attrs.push(KeyValue::new(semconv::HTTP_CLIENT_IP, addr.ip().to_string()));
    }

    attrs
}

/// Extracts the response-phase attributes: status code and, when the router
/// matched one, the route template.
pub(crate) fn response_attributes(status: StatusCode, route: Option<&str>) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(
        semconv::HTTP_STATUS_CODE,
        i64::from(status.as_u16()),
    )];
    if let Some(route) = route {
        attrs.push(KeyValue::new(semconv::HTTP_ROUTE, route.to_owned()));
    }
    attrs
}

/// Request body size as declared by `content-length`; the body itself is
/// never buffered by this layer.
pub(crate) fn request_body_size(req: &Request) -> u64 {
    content_length(req.headers())
}

/// Response body size: the exact size when the body reports one, otherwise
/// the `content-length` header, otherwise zero.
pub(crate) fn response_body_size(res: &Response) -> u64 {
    res.body()
        .size_hint()
        .exact()
        .unwrap_or_else(|| content_length(res.headers()))
}

fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn request_host(req: &Request) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| req.uri().host().map(str::to_owned))
}
