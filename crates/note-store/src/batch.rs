//! Bounded fan-out over a fixed number of worker threads.

use std::thread;

/// Number of concurrent batches used for loading and tag rebuilding.
pub const BATCH_COUNT: usize = 5;

/// Outcome of one worker's batch.
#[derive(Debug)]
pub struct BatchOutcome<R, E> {
    pub results: Vec<R>,
    /// First error hit by the worker; the rest of its batch was skipped.
    pub error: Option<E>,
}

/// Split `items` into [`BATCH_COUNT`] roughly equal batches and run `work` over each
/// batch on its own scoped thread.
///
/// Each worker walks its batch in order and stops at its first error. Workers do not
/// share state; results and errors are merged after every worker has joined.
pub fn run_batches<T, R, E, F>(items: &[T], work: F) -> (Vec<R>, Vec<E>)
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    if items.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let batch_size = items.len().div_ceil(BATCH_COUNT);
    tracing::debug!(
        items = items.len(),
        batch_size,
        "running {} batch(es)",
        items.len().div_ceil(batch_size)
    );

    let work = &work;
    let outcomes: Vec<BatchOutcome<R, E>> = thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(batch_size)
            .map(|batch| scope.spawn(move || run_batch(batch, work)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut results = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        results.extend(outcome.results);
        errors.extend(outcome.error);
    }
    (results, errors)
}

fn run_batch<T, R, E, F>(batch: &[T], work: &F) -> BatchOutcome<R, E>
where
    F: Fn(&T) -> Result<R, E>,
{
    let mut results = Vec::with_capacity(batch.len());
    for item in batch {
        match work(item) {
            Ok(result) => results.push(result),
            Err(error) => {
                return BatchOutcome {
                    results,
                    error: Some(error),
                }
            }
        }
    }
    BatchOutcome {
        results,
        error: None,
    }
}
