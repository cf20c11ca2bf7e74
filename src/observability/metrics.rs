use std::time::Instant;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub operations_total: IntCounterVec,
    pub operation_latency_seconds: HistogramVec,
    pub pending_slots: IntGauge,
    pub eligible_drivers: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new(
                "workflow_operations_total",
                "Workflow operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )
        .expect("valid workflow_operations_total metric");

        let operation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "workflow_operation_latency_seconds",
                "Latency of workflow operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid workflow_operation_latency_seconds metric");

        let pending_slots = IntGauge::new("pending_slots", "Response slots awaiting an answer")
            .expect("valid pending_slots metric");

        let eligible_drivers = Histogram::with_opts(
            HistogramOpts::new("eligible_drivers", "Drivers notified per dispatch").buckets(
                vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0],
            ),
        )
        .expect("valid eligible_drivers metric");

        registry
            .register(Box::new(operations_total.clone()))
            .expect("register workflow_operations_total");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("register workflow_operation_latency_seconds");
        registry
            .register(Box::new(pending_slots.clone()))
            .expect("register pending_slots");
        registry
            .register(Box::new(eligible_drivers.clone()))
            .expect("register eligible_drivers");

        Self {
            registry,
            operations_total,
            operation_latency_seconds,
            pending_slots,
            eligible_drivers,
        }
    }

    /// Counts one finished operation and its latency since `start`.
    pub fn record(&self, operation: &str, outcome: &str, start: Instant) {
        self.operations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.operation_latency_seconds
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
