//! Sizing Metrics
//!
//! Prometheus counters describing sizing runs and the amount of input noise
//! they recovered from. Each `SizingMetrics` owns its registry.

use crate::error::Result;
use crate::ingest::IngestStats;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Metric namespace
const NAMESPACE: &str = "capacity_sizer";

/// Prometheus counters for the sizer
#[derive(Clone)]
pub struct SizingMetrics {
    registry: Registry,
    runs: IntCounterVec,
    lines: IntCounter,
    dropped_rows: IntCounter,
    zeroed_values: IntCounter,
    clients: Histogram,
}

impl SizingMetrics {
    /// Create and register every metric
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let runs = IntCounterVec::new(
            Opts::new("runs_total", "Sizing runs by mode").namespace(NAMESPACE),
            &["mode"],
        )?;
        let lines = IntCounter::with_opts(
            Opts::new("input_lines_total", "Input lines read").namespace(NAMESPACE),
        )?;
        let dropped_rows = IntCounter::with_opts(
            Opts::new("dropped_rows_total", "Rows dropped for an unknown shape")
                .namespace(NAMESPACE),
        )?;
        let zeroed_values = IntCounter::with_opts(
            Opts::new("zeroed_values_total", "Cells normalized to zero").namespace(NAMESPACE),
        )?;
        let clients = Histogram::with_opts(
            HistogramOpts::new("clients_per_run", "Clients in each sizing run")
                .namespace(NAMESPACE)
                .buckets(vec![1.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(lines.clone()))?;
        registry.register(Box::new(dropped_rows.clone()))?;
        registry.register(Box::new(zeroed_values.clone()))?;
        registry.register(Box::new(clients.clone()))?;

        Ok(Self {
            registry,
            runs,
            lines,
            dropped_rows,
            zeroed_values,
            clients,
        })
    }

    /// Record one run
    pub fn observe_run(&self, mode: &str, clients: usize, stats: &IngestStats) {
        self.runs.with_label_values(&[mode]).inc();
        self.lines.inc_by(stats.lines);
        self.dropped_rows.inc_by(stats.dropped_rows);
        self.zeroed_values.inc_by(stats.zeroed_values);
        self.clients.observe(clients as f64);
    }

    /// Encode in the Prometheus text format; returns (content type, body)
    pub fn encode(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_encode() {
        let metrics = SizingMetrics::new().unwrap();
        let stats = IngestStats {
            lines: 10,
            dropped_rows: 3,
            zeroed_values: 2,
            ..Default::default()
        };
        metrics.observe_run("tiers", 4, &stats);
        metrics.observe_run("allocation", 4, &stats);

        let (content_type, body) = metrics.encode().unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("capacity_sizer_runs_total{mode=\"tiers\"} 1"));
        assert!(text.contains("capacity_sizer_dropped_rows_total 6"));
        assert!(text.contains("capacity_sizer_input_lines_total 20"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = SizingMetrics::new().unwrap();
        let b = SizingMetrics::new().unwrap();
        a.observe_run("tiers", 1, &IngestStats::default());

        let (_, body) = b.encode().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains("mode=\"tiers\""));
    }
}
