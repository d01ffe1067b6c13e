//! Progress reporting hooks for long-running operations.

use contentforge_shared::{CostMetrics, WorkItem};

/// Receives pipeline progress callbacks. Implementations must be cheap;
/// they run inline with the pipeline.
pub trait ProgressReporter: Send + Sync {
    /// A new phase of the run started.
    fn phase(&self, name: &str);

    /// An item changed state. `current`/`total` are 1-based progress counts.
    fn item_update(&self, item: &WorkItem, current: usize, total: usize);

    /// Cumulative cost totals changed.
    fn totals(&self, totals: &CostMetrics);
}

/// Reporter that discards all progress.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_update(&self, _item: &WorkItem, _current: usize, _total: usize) {}
    fn totals(&self, _totals: &CostMetrics) {}
}

/// Reporter that emits progress through `tracing`.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn phase(&self, name: &str) {
        tracing::info!(phase = name, "phase started");
    }

    fn item_update(&self, item: &WorkItem, current: usize, total: usize) {
        tracing::info!(
            subject = %item.subject,
            status = %item.status,
            attempts = item.attempts,
            progress = format!("{current}/{total}"),
            "item update"
        );
    }

    fn totals(&self, totals: &CostMetrics) {
        tracing::debug!(
            cost = totals.total_cost(),
            tokens_in = totals.tokens_in,
            tokens_out = totals.tokens_out,
            "cost totals"
        );
    }
}
