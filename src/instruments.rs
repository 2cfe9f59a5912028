//! Metric instruments recorded by the middleware.

use opentelemetry::metrics::{Histogram, Meter, UpDownCounter};

use crate::semconv;

/// The four HTTP server instruments, created once per installed layer.
///
/// Instrument identity never changes after creation; requests only record
/// values into them, which the SDK guarantees to be safe under concurrent
/// use. A conflicting registration (e.g. the same name with a different
/// unit) is reported through the SDK's own diagnostics and yields a no-op
/// instrument, so construction never fails.
pub(crate) struct ServerInstruments {
    /// Histogram of request duration in fractional milliseconds.
    pub duration: Histogram<f64>,
    /// Histogram of request body sizes in bytes.
    pub request_size: Histogram<u64>,
    /// Histogram of response body sizes in bytes.
    pub response_size: Histogram<u64>,
    /// Gauge of requests currently in flight.
    pub active_requests: UpDownCounter<i64>,
}

impl ServerInstruments {
    /// Creates the instrument set from a meter.
    pub(crate) fn new(meter: &Meter) -> Self {
        Self {
            duration: meter
                .f64_histogram(semconv::METRIC_HTTP_SERVER_DURATION)
                .with_description("Measures the duration of inbound HTTP requests")
                .with_unit(semconv::UNIT_MILLISECONDS)
                .init(),
            request_size: meter
                .u64_histogram(semconv::METRIC_HTTP_SERVER_REQUEST_SIZE)
                .with_description("Measures the size of HTTP request messages")
                .with_unit(semconv::UNIT_BYTES)
                .init(),
            response_size: meter
                .u64_histogram(semconv::METRIC_HTTP_SERVER_RESPONSE_SIZE)
                .with_description("Measures the size of HTTP response messages")
                .with_unit(semconv::UNIT_BYTES)
                .init(),
            active_requests: meter
                .i64_up_down_counter(semconv::METRIC_HTTP_SERVER_ACTIVE_REQUESTS)
                .with_description(
                    "Measures the number of concurrent HTTP requests that are currently in-flight",
                )
                .with_unit(semconv::UNIT_DIMENSIONLESS)
                .init(),
        }
    }
}
