use {axum::http::StatusCode, std::time::Instant};

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "proxy")]
pub struct Metrics {
    /// Number of completed proxy requests.
    #[metric(labels("upstream", "status_code"))]
    pub requests_complete: prometheus::IntCounterVec,

    /// Time spent waiting for the upstream aggregator.
    #[metric(labels("upstream"), buckets(0.1, 0.25, 0.5, 1, 2, 4, 8))]
    pub upstream_duration_seconds: prometheus::HistogramVec,
}

impl Metrics {
    pub fn get() -> &'static Self {
        Metrics::instance(observe::metrics::get_storage_registry())
            .expect("unexpected error getting metrics instance")
    }

    pub fn on_request_completed(upstream: &str, status: StatusCode, timer: Instant) {
        Self::get()
            .requests_complete
            .with_label_values(&[upstream, status.as_str()])
            .inc();
        tracing::trace!(
            upstream,
            %status,
            elapsed = ?timer.elapsed(),
            "proxy request completed",
        );
    }
}
