//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): invoke requests by model id
//! - `gateway_frames_total` (counter): frames pushed to response streams
//! - `gateway_request_duration_seconds` (histogram): pipeline time per request
//! - `gateway_gate_wait_seconds` (histogram): arrival gate wait time
//!
//! # Design Decisions
//! - Low-overhead updates via the `metrics` facade
//! - The Prometheus exporter binds its own listener, off the request path

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus scrape endpoint on the given address.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Record one invoke request.
pub fn record_request(model_id: &str) {
    metrics::counter!("gateway_requests_total", "model_id" => model_id.to_string()).increment(1);
}

/// Record how long a request's streaming pipeline ran, start to close.
pub fn record_request_duration(elapsed: Duration) {
    metrics::histogram!("gateway_request_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record one frame pushed to a response stream.
pub fn record_frame() {
    metrics::counter!("gateway_frames_total").increment(1);
}

/// Record how long an arrival gate waited before resolving.
pub fn record_gate_wait(elapsed: Duration) {
    metrics::histogram!("gateway_gate_wait_seconds").record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use metrics::{
        Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString,
        Unit,
    };

    use super::*;

    #[derive(Default)]
    struct Samples(AtomicUsize);

    impl HistogramFn for Samples {
        fn record(&self, _value: f64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CaptureRecorder {
        name: &'static str,
        samples: Arc<Samples>,
    }

    impl Recorder for CaptureRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            assert_eq!(key.name(), self.name);
            Histogram::from_arc(Arc::clone(&self.samples))
        }
    }

    #[test]
    fn request_duration_lands_in_its_histogram() {
        let samples = Arc::new(Samples::default());
        let recorder = CaptureRecorder {
            name: "gateway_request_duration_seconds",
            samples: Arc::clone(&samples),
        };
        metrics::with_local_recorder(&recorder, || {
            record_request_duration(Duration::from_millis(25));
        });
        assert_eq!(samples.0.load(Ordering::SeqCst), 1);
    }
}
