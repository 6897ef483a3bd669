// Prometheus metrics for replay decoding and playback.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Decode sessions started (one per decoder construction or reset).
    pub static ref DECODE_SESSIONS_TOTAL: IntCounter = IntCounter::new(
        "swarm_replay_decode_sessions_total",
        "Decode sessions started",
    )
    .unwrap();

    /// Step records extracted from compressed logs.
    pub static ref STEPS_DECODED_TOTAL: IntCounter = IntCounter::new(
        "swarm_replay_steps_decoded_total",
        "Step records decoded",
    )
    .unwrap();

    /// Compressed bytes fed to the inflater.
    pub static ref COMPRESSED_BYTES_TOTAL: IntCounter = IntCounter::new(
        "swarm_replay_compressed_bytes_total",
        "Compressed bytes consumed by the inflater",
    )
    .unwrap();

    /// Decoded bytes produced by the inflater.
    pub static ref INFLATED_BYTES_TOTAL: IntCounter = IntCounter::new(
        "swarm_replay_inflated_bytes_total",
        "Decoded bytes produced by the inflater",
    )
    .unwrap();

    /// Decode failures, by error kind.
    pub static ref DECODE_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("swarm_replay_decode_errors_total", "Decode failures"),
        &["kind"],
    )
    .unwrap();

    /// Logs written by the replay writer.
    pub static ref LOGS_WRITTEN_TOTAL: IntCounter = IntCounter::new(
        "swarm_replay_logs_written_total",
        "Logs finished by the replay writer",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Size of each extracted structural unit in bytes.
    pub static ref UNIT_BYTES: Histogram = Histogram::with_opts(
        HistogramOpts::new("swarm_replay_unit_bytes", "Extracted unit size in bytes")
            .buckets(vec![64.0, 256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0]),
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DECODE_SESSIONS_TOTAL.clone()),
        Box::new(STEPS_DECODED_TOTAL.clone()),
        Box::new(COMPRESSED_BYTES_TOTAL.clone()),
        Box::new(INFLATED_BYTES_TOTAL.clone()),
        Box::new(DECODE_ERRORS_TOTAL.clone()),
        Box::new(LOGS_WRITTEN_TOTAL.clone()),
        Box::new(UNIT_BYTES.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("metric registration skipped: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
