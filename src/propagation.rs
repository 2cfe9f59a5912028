//! Parent trace context extraction from inbound request headers.

use axum::http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::{Context, global};

/// Adapter exposing an HTTP header map to a [`TextMapPropagator`].
struct HeaderCarrier<'a>(&'a HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Decodes any parent trace context carried by the inbound headers.
///
/// When no propagator was configured, the process-wide registry is
/// consulted. Absent or malformed headers leave the current context
/// untouched, so the caller starts a fresh root span instead of a broken
/// link; decoding never surfaces an error.
pub(crate) fn extract_remote_context(
    propagator: Option<&(dyn TextMapPropagator + Send + Sync)>,
    headers: &HeaderMap,
) -> Context {
    let carrier = HeaderCarrier(headers);
    match propagator {
        Some(propagator) => propagator.extract(&carrier),
        None => global::get_text_map_propagator(|propagator| propagator.extract(&carrier)),
    }
}
