//! Moka store capacity metrics.
//!
//! Enable the `metrics` feature to use these metrics.
//!
//! ## Metrics
//!
//! - `shelter_moka_entries` - Current number of entries in a generation (gauge)
//! - `shelter_moka_generations` - Current number of open generations (gauge)
//!
//! Both metrics include a `backend` label to distinguish between multiple Moka instances.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the per-generation entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "shelter_moka_entries",
            "Current number of entries in a Moka generation."
        );
        "shelter_moka_entries"
    };

    /// Metric name for the open generations gauge.
    pub static ref MOKA_GENERATIONS: &'static str = {
        metrics::describe_gauge!(
            "shelter_moka_generations",
            "Current number of open generations in the Moka store."
        );
        "shelter_moka_generations"
    };
}

/// Record the entry count of one generation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_entries(backend: &str, generation: &str, entries: u64) {
    metrics::gauge!(
        *MOKA_ENTRIES,
        "backend" => backend.to_string(),
        "generation" => generation.to_string()
    )
    .set(entries as f64);
}

/// Record the entry count of one generation (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_entries(_backend: &str, _generation: &str, _entries: u64) {}

/// Record the number of open generations.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_generations(backend: &str, generations: usize) {
    metrics::gauge!(*MOKA_GENERATIONS, "backend" => backend.to_string())
        .set(generations as f64);
}

/// Record the number of open generations (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_generations(_backend: &str, _generations: usize) {}
