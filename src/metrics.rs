//! Prometheus instrumentation for the engine.
//!
//! Scaled down from a block-indexer's pipeline metrics to the handful of
//! signals this engine actually produces: dispatch counts, response
//! outcomes, DAH signals, and per-operation latency. Never consulted by
//! handler logic.

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

const LATENCY_BUCKETS: &[f64] = &[0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1];

lazy_static! {
    /// Global Prometheus registry for this process.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Invocations by operation name.
    pub static ref OPS_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("utxo_engine_ops_dispatched_total", "Invocations by operation name"),
        &["op"]
    ).unwrap();

    /// Responses by errorCode ("" for OK).
    pub static ref RESPONSES_BY_ERROR_CODE: IntCounterVec = IntCounterVec::new(
        Opts::new("utxo_engine_responses_total", "Responses by errorCode"),
        &["error_code"]
    ).unwrap();

    /// DAH signals emitted, by kind.
    pub static ref DAH_SIGNALS: IntCounterVec = IntCounterVec::new(
        Opts::new("utxo_engine_dah_signals_total", "DAH evaluator signals emitted, by kind"),
        &["signal"]
    ).unwrap();

    /// Per-operation latency.
    pub static ref OP_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("utxo_engine_op_duration_seconds", "Per-operation handler latency")
            .buckets(LATENCY_BUCKETS.to_vec()),
        &["op"]
    ).unwrap();
}

pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    REGISTRY.register(Box::new(OPS_DISPATCHED.clone()))?;
    REGISTRY.register(Box::new(RESPONSES_BY_ERROR_CODE.clone()))?;
    REGISTRY.register(Box::new(DAH_SIGNALS.clone()))?;
    REGISTRY.register(Box::new(OP_DURATION.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

pub fn record_dispatch(op: &str) {
    OPS_DISPATCHED.with_label_values(&[op]).inc();
}

pub fn record_response(error_code: Option<&str>) {
    RESPONSES_BY_ERROR_CODE.with_label_values(&[error_code.unwrap_or("")]).inc();
}

pub fn record_signal(signal: &str) {
    DAH_SIGNALS.with_label_values(&[signal]).inc();
}

/// A handle returned by [`start_op_timer`]; dropping it (or calling
/// [`OpTimer::observe`] explicitly) records the elapsed duration.
pub struct OpTimer {
    histogram: Histogram,
    start: Instant,
    observed: bool,
}

impl OpTimer {
    pub fn observe(mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
        self.observed = true;
    }
}

impl Drop for OpTimer {
    fn drop(&mut self) {
        if !self.observed {
            self.histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}

pub fn start_op_timer(op: &str) -> OpTimer {
    OpTimer {
        histogram: OP_DURATION.with_label_values(&[op]),
        start: Instant::now(),
        observed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_metrics_includes_registered_families() {
        let _ = init_metrics();
        record_dispatch("spend");
        record_response(Some("LOCKED"));
        record_signal("DAHSET");
        let _timer = start_op_timer("spend");
        let text = gather_metrics();
        assert!(text.contains("utxo_engine_ops_dispatched_total"));
        assert!(text.contains("utxo_engine_responses_total"));
        assert!(text.contains("utxo_engine_dah_signals_total"));
    }
}
