use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref READINGS_RECORDED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "telemetry_readings_recorded_total",
        "Total readings accepted and stored"
    ))
    .unwrap();
    pub static ref READINGS_REJECTED_TOTAL: Counter = Counter::with_opts(Opts::new(
        "telemetry_readings_rejected_total",
        "Total readings rejected by validation"
    ))
    .unwrap();
    pub static ref DB_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "telemetry_db_failures_total",
        "Total reading store failures"
    ))
    .unwrap();
    pub static ref QUERY_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "telemetry_query_latency_seconds",
            "Time taken to scan the reading store"
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0
        ])
    )
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY
        .register(Box::new(READINGS_RECORDED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(READINGS_REJECTED_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(DB_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(QUERY_LATENCY_SECONDS.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
