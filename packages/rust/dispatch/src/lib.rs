//! Fixed-chunk concurrent dispatcher.
//!
//! Runs a batch of independent async operations in fixed-size chunks: every
//! operation inside a chunk runs concurrently, chunks run in order, and a
//! fixed delay separates consecutive chunks (no delay after the last one).
//! One failed operation never stops the batch; results come back per slot in
//! submission order.

use std::future::Future;
use std::time::Duration;

/// Result of one dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation created its resource.
    Success,
    /// The target already satisfied the request; counted as done, not failed.
    AlreadySatisfied,
    /// The operation failed with the given message.
    Failure(String),
}

/// Per-slot outcomes of a full batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<Outcome>,
}

impl DispatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Success))
            .count()
    }

    pub fn already_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::AlreadySatisfied))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failure(_)))
            .count()
    }
}

/// Run `ops` in chunks of `chunk_size`, waiting `inter_chunk_delay` between
/// consecutive chunks.
///
/// A `chunk_size` of zero is treated as one. Operations inside a chunk are
/// spawned and awaited together; a panicked task records a failure in its
/// slot without affecting its neighbors.
pub async fn dispatch<F, Fut>(
    ops: Vec<F>,
    chunk_size: usize,
    inter_chunk_delay: Duration,
) -> DispatchReport
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    let chunk_size = chunk_size.max(1);
    let total = ops.len();
    let chunk_count = total.div_ceil(chunk_size);
    let mut slots: Vec<Option<Outcome>> = Vec::new();
    slots.resize_with(total, || None);

    let mut ops = ops.into_iter().enumerate();

    for chunk_index in 0..chunk_count {
        let mut handles = Vec::with_capacity(chunk_size);
        for (slot, op) in ops.by_ref().take(chunk_size) {
            handles.push((slot, tokio::spawn(op())));
        }

        tracing::debug!(
            chunk = chunk_index + 1,
            of = chunk_count,
            size = handles.len(),
            "dispatching chunk"
        );

        for (slot, handle) in handles {
            slots[slot] = Some(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failure(format!("task panicked: {e}")),
            });
        }

        if chunk_index + 1 < chunk_count {
            tokio::time::sleep(inter_chunk_delay).await;
        }
    }

    DispatchReport {
        outcomes: slots.into_iter().flatten().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn delay_separates_chunks_but_not_the_tail() {
        let ops: Vec<_> = (0..23)
            .map(|_| move || async { Outcome::Success })
            .collect();

        let started = Instant::now();
        let report = dispatch(ops, 10, Duration::from_secs(1)).await;

        // 3 chunks -> exactly 2 inter-chunk delays
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(report.outcomes.len(), 23);
        assert_eq!(report.success_count(), 23);
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes_keep_submission_order() {
        let ops: Vec<_> = (0..8)
            .map(|i| {
                move || async move {
                    // Later slots finish first inside their chunk
                    tokio::time::sleep(Duration::from_millis(100 - i * 10)).await;
                    Outcome::Failure(format!("op {i}"))
                }
            })
            .collect();

        let report = dispatch(ops, 4, Duration::from_millis(10)).await;
        for (i, outcome) in report.outcomes.iter().enumerate() {
            assert_eq!(*outcome, Outcome::Failure(format!("op {i}")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn chunk_members_run_concurrently() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let ops: Vec<_> = (0..5)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                move || async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Outcome::Success
                }
            })
            .collect();

        dispatch(ops, 5, Duration::ZERO).await;
        assert_eq!(peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_outcomes_are_counted() {
        let ops: Vec<_> = (0..6)
            .map(|i| {
                move || async move {
                    match i % 3 {
                        0 => Outcome::Success,
                        1 => Outcome::AlreadySatisfied,
                        _ => Outcome::Failure("boom".into()),
                    }
                }
            })
            .collect();

        let report = dispatch(ops, 2, Duration::from_millis(5)).await;
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.already_count(), 2);
        assert_eq!(report.failure_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_chunk_size_is_clamped() {
        let ops: Vec<_> = (0..3)
            .map(|_| move || async { Outcome::Success })
            .collect();
        let report = dispatch(ops, 0, Duration::ZERO).await;
        assert_eq!(report.success_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_is_a_noop() {
        let ops: Vec<fn() -> std::future::Ready<Outcome>> = Vec::new();
        let report = dispatch(ops, 10, Duration::from_secs(1)).await;
        assert!(report.outcomes.is_empty());
    }
}
