//! Metrics collection using Prometheus
//!
//! Counters and histograms describing the comparisons flowing through a ledger.

use crate::types::{OutcomeKind, UpdateResult};
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector for rating updates
#[derive(Clone)]
pub struct RatingMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Comparisons recorded, labelled by upset/expected/even
    pub comparisons_total: IntCounterVec,

    /// Magnitude of the winner's rating change
    pub rating_delta: Histogram,

    /// Confidence of each update
    pub update_confidence: Histogram,

    /// Time spent inside the rating calculator
    pub rating_calculation_duration: Histogram,

    /// Ratings pulled toward the mean because of inactivity
    pub idle_compressions_total: IntCounter,

    /// Jokes currently held by the ledger
    pub tracked_jokes: IntGauge,
}

impl RatingMetrics {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let comparisons_total = IntCounterVec::new(
            Opts::new("punchline_comparisons_total", "Total comparisons recorded"),
            &["outcome"],
        )?;
        registry.register(Box::new(comparisons_total.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new("punchline_rating_delta", "Winner rating change per comparison")
                .buckets(vec![2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0, 80.0, 100.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        let update_confidence = Histogram::with_opts(
            HistogramOpts::new("punchline_update_confidence", "Confidence of rating updates")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )?;
        registry.register(Box::new(update_confidence.clone()))?;

        let rating_calculation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "punchline_rating_calculation_duration_seconds",
                "Rating calculation time",
            )
            .buckets(vec![1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 1e-2]),
        )?;
        registry.register(Box::new(rating_calculation_duration.clone()))?;

        let idle_compressions_total = IntCounter::new(
            "punchline_idle_compressions_total",
            "Ratings compressed toward the mean after inactivity",
        )?;
        registry.register(Box::new(idle_compressions_total.clone()))?;

        let tracked_jokes = IntGauge::new("punchline_tracked_jokes", "Jokes held by the ledger")?;
        registry.register(Box::new(tracked_jokes.clone()))?;

        Ok(Self {
            registry,
            comparisons_total,
            rating_delta,
            update_confidence,
            rating_calculation_duration,
            idle_compressions_total,
            tracked_jokes,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record one completed update
    pub fn record_update(&self, result: &UpdateResult, duration: Duration) {
        self.comparisons_total
            .with_label_values(&[result.outcome_kind().as_str()])
            .inc();
        self.rating_delta
            .observe(result.diagnostics.winner_delta.abs());
        self.update_confidence.observe(result.confidence);
        self.rating_calculation_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_compressions(&self, count: usize) {
        self.idle_compressions_total.inc_by(count as u64);
    }

    pub fn set_tracked_jokes(&self, count: usize) {
        self.tracked_jokes.set(count as i64);
    }

    /// Comparisons recorded so far for one outcome kind
    pub fn comparisons(&self, outcome: OutcomeKind) -> u64 {
        self.comparisons_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Render every metric in the Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
