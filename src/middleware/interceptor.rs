//! The per-request interception bracket: span start, handler dispatch,
//! guaranteed teardown.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::trace::{SpanBuilder, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::attributes::{self, AttributeSet};
use crate::config::{ResolvedConfig, RouteInfo};
use crate::middleware::TRACING_TARGET;
use crate::propagation;
use crate::semconv;

/// Wraps one request: starts the span, dispatches the rest of the chain,
/// and finalizes span and metrics.
pub(crate) async fn intercept(
    shared: Arc<ResolvedConfig>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(filter) = &shared.filter {
        if !filter(&req) {
            return next.run(req).await;
        }
    }

    let start = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned());
    let request_size = attributes::request_body_size(&req);

    let parent_cx = propagation::extract_remote_context(shared.propagator.as_deref(), req.headers());
    if parent_cx.span().span_context().is_remote() {
        tracing::debug!(
            target: TRACING_TARGET,
            trace_id = %parent_cx.span().span_context().trace_id(),
            "continuing trace from inbound request headers"
        );
    }

    let mut request_attrs = attributes::request_attributes(&req);
    for provider in &shared.attribute_providers {
        request_attrs.extend(provider(&req));
    }
    let attrs = AttributeSet::from_request_phase(request_attrs);

    // The gauge moves before dispatch; the tracker's Drop pairs it with
    // exactly one decrement on every exit path.
    shared.instruments.active_requests.add(1, attrs.request_phase());

    // The literal path is a placeholder; the name is corrected after
    // dispatch once the matched route template is known.
    let span = shared.tracer.build_with_context(
        SpanBuilder::from_name(path.clone())
            .with_kind(SpanKind::Server)
            .with_attributes(attrs.request_phase().to_vec()),
        &parent_cx,
    );
    let cx = parent_cx.with_span(span);

    // Downstream handlers reach the active span through this extension,
    // e.g. to attach child spans or events.
    req.extensions_mut().insert(cx.clone());

    let mut tracker = RequestTracker {
        shared: Arc::clone(&shared),
        cx,
        start,
        attrs,
        request_size,
        response_size: 0,
    };

    let response = next.run(req).await;

    tracker.observe_response(&response, &method, &path, route.as_deref());
    drop(tracker);

    response
}

/// Guaranteed-teardown guard for one in-flight request.
///
/// Dropped on every exit path, including panics unwinding out of the
/// handler: decrements the active-request gauge, records the duration and
/// size histograms with whatever phases the attribute set holds at that
/// point, and ends the span exactly once.
struct RequestTracker {
    shared: Arc<ResolvedConfig>,
    cx: Context,
    start: Instant,
    attrs: AttributeSet,
    request_size: u64,
    response_size: u64,
}

impl RequestTracker {
    /// Response-phase bookkeeping on the non-panic path: appends the
    /// response attributes, fixes the span name, and applies the span
    /// status derived from the status code actually sent.
    fn observe_response(
        &mut self,
        response: &Response,
        method: &Method,
        path: &str,
        route: Option<&str>,
    ) {
        let status = response.status();
        self.response_size = attributes::response_body_size(response);
        self.attrs
            .append_response_phase(attributes::response_attributes(status, route));

        let span = self.cx.span();
        for attr in self.attrs.response_phase() {
            span.set_attribute(attr.clone());
        }
        span.set_attribute(KeyValue::new(
            semconv::HTTP_RESPONSE_CONTENT_LENGTH,
            self.response_size as i64,
        ));

        let info = RouteInfo { method, path, route };
        span.update_name((self.shared.span_name_formatter)(&info));

        let span_status = semconv::span_status_from_http(status);
        if let Status::Error { description } = &span_status {
            span.add_event(
                "exception",
                vec![KeyValue::new("exception.message", description.to_string())],
            );
        }
        span.set_status(span_status);
    }
}

impl Drop for RequestTracker {
    fn drop(&mut self) {
        let instruments = &self.shared.instruments;
        instruments
            .active_requests
            .add(-1, self.attrs.request_phase());

        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1_000.0;
        instruments.duration.record(elapsed_ms, self.attrs.all());
        instruments
            .request_size
            .record(self.request_size, self.attrs.all());
        instruments
            .response_size
            .record(self.response_size, self.attrs.all());

        self.cx.span().end();
    }
}
