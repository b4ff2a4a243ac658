//! Metrics declaration and recording helpers.
//!
//! With the `metrics` feature disabled every helper is an empty inline
//! function and the calls compile away.

use std::time::Duration;

use crate::context::CacheContext;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Request metrics

    /// Track number of served requests by strategy, status and source.
    pub static ref REQUESTS_SERVED: &'static str = {
        metrics::describe_counter!(
            "shelter_requests_total",
            "Total number of requests served, by strategy, cache status and source."
        );
        "shelter_requests_total"
    };
    /// Histogram of request duration.
    pub static ref REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shelter_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of served requests in seconds."
        );
        "shelter_request_duration_seconds"
    };
    /// Track store failures absorbed by the engine.
    pub static ref STORE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "shelter_store_errors_total",
            "Total number of store failures treated as a miss or skipped write."
        );
        "shelter_store_errors_total"
    };

    // Revalidation metrics

    /// Track number of background revalidations by outcome.
    pub static ref REVALIDATIONS: &'static str = {
        metrics::describe_counter!(
            "shelter_revalidations_total",
            "Total number of background revalidations, by outcome."
        );
        "shelter_revalidations_total"
    };

    // Lifecycle metrics

    /// Track number of generations pruned at activation.
    pub static ref GENERATIONS_PRUNED: &'static str = {
        metrics::describe_counter!(
            "shelter_generations_pruned_total",
            "Total number of superseded generations deleted at activation."
        );
        "shelter_generations_pruned_total"
    };
    /// Track shell resources pre-warmed at install, by outcome.
    pub static ref SHELL_RESOURCES: &'static str = {
        metrics::describe_counter!(
            "shelter_shell_resources_total",
            "Total number of shell resources processed at install, by outcome."
        );
        "shelter_shell_resources_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "shelter_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "shelter_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "shelter_offload_tasks_completed_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "shelter_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "shelter_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shelter_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "shelter_offload_task_duration_seconds"
    };
}

/// Record a served request.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_served(ctx: &CacheContext, duration: Duration) {
    let strategy = ctx.strategy.map(|s| s.as_str()).unwrap_or("none");
    let status = ctx.status.as_str();
    let source = ctx.source.as_str().to_owned();
    metrics::counter!(
        *REQUESTS_SERVED,
        "strategy" => strategy,
        "status" => status,
        "source" => source.clone()
    )
    .increment(1);
    metrics::histogram!(
        *REQUEST_DURATION,
        "strategy" => strategy,
        "source" => source
    )
    .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_served(_ctx: &CacheContext, _duration: Duration) {}

/// Record a store failure absorbed during `operation` ("read" or "write").
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_error(backend: &str, operation: &'static str) {
    metrics::counter!(
        *STORE_ERRORS,
        "backend" => backend.to_owned(),
        "operation" => operation
    )
    .increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_error(_backend: &str, _operation: &'static str) {}

/// Record a finished background revalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation(outcome: &'static str) {
    metrics::counter!(*REVALIDATIONS, "outcome" => outcome).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation(_outcome: &'static str) {}

/// Record generations pruned at activation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_pruned(count: usize) {
    metrics::counter!(*GENERATIONS_PRUNED).increment(count as u64);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_pruned(_count: usize) {}

/// Record a shell resource processed at install.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_shell_resource(outcome: &'static str) {
    metrics::counter!(*SHELL_RESOURCES, "outcome" => outcome).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_shell_resource(_outcome: &'static str) {}

/// Record a spawned offload task.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_spawned(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_owned()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).increment(1.0);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_spawned(_kind: &str) {}

/// Record a completed offload task.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_completed(kind: &str, duration: Duration) {
    metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.to_owned()).increment(1);
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_owned())
        .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_completed(_kind: &str, _duration: Duration) {}
