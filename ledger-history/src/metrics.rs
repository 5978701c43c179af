//! Metrics collection for observability
//!
//! Prometheus metrics for the write and delete fan-out. Each [`Metrics`]
//! owns its registry, so several history instances can live in one process.
//!
//! # Metrics
//!
//! - `history_rows_written_total{table}` - Rows put, per table
//! - `history_rows_deleted_total{table}` - Rows deleted, per table
//! - `history_batch_failures_total{operation}` - Calls that ended incomplete
//! - `history_batch_duration_seconds{operation}` - Fan-out latency

use crate::tables::Table;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Rows written per table
    pub rows_written: IntCounterVec,

    /// Rows deleted per table
    pub rows_deleted: IntCounterVec,

    /// Incomplete fan-outs per operation
    pub batch_failures: IntCounterVec,

    /// Fan-out duration per operation
    pub batch_duration: HistogramVec,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let rows_written = IntCounterVec::new(
            Opts::new("history_rows_written_total", "Rows written per table"),
            &["table"],
        )?;
        registry.register(Box::new(rows_written.clone()))?;

        let rows_deleted = IntCounterVec::new(
            Opts::new("history_rows_deleted_total", "Rows deleted per table"),
            &["table"],
        )?;
        registry.register(Box::new(rows_deleted.clone()))?;

        let batch_failures = IntCounterVec::new(
            Opts::new(
                "history_batch_failures_total",
                "Fan-outs in which at least one table failed",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(batch_failures.clone()))?;

        let batch_duration = HistogramVec::new(
            HistogramOpts::new(
                "history_batch_duration_seconds",
                "Histogram of fan-out latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            rows_written,
            rows_deleted,
            batch_failures,
            batch_duration,
            registry,
        })
    }

    /// Record rows put into one table
    pub fn record_written(&self, table: Table, rows: usize) {
        self.rows_written
            .with_label_values(&[table.name()])
            .inc_by(rows as u64);
    }

    /// Record rows deleted from one table
    pub fn record_deleted(&self, table: Table, rows: usize) {
        self.rows_deleted
            .with_label_values(&[table.name()])
            .inc_by(rows as u64);
    }

    /// Record an incomplete fan-out
    pub fn record_failure(&self, operation: &str) {
        self.batch_failures.with_label_values(&[operation]).inc();
    }

    /// Record fan-out duration
    pub fn record_duration(&self, operation: &str, duration_seconds: f64) {
        self.batch_duration
            .with_label_values(&[operation])
            .observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
