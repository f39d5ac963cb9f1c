// ABOUTME: Runs a list of async actions in fixed-size batches with a pause between batches.
// ABOUTME: Members of a batch run together; batches never overlap.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

use crate::types::Concurrency;

/// Default pause between consecutive batches.
pub const DEFAULT_PACING: Duration = Duration::from_secs(3);

/// Bounded, paced fan-out over a list of work items.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    concurrency: Concurrency,
    pacing: Duration,
}

impl BatchExecutor {
    pub fn new(concurrency: Concurrency, pacing: Duration) -> Self {
        Self {
            concurrency,
            pacing,
        }
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Sizes of the batches `total` items would be split into.
    pub fn batch_sizes(&self, total: usize) -> Vec<usize> {
        let size = self.concurrency.get();
        (0..total)
            .step_by(size)
            .map(|start| size.min(total - start))
            .collect()
    }

    /// Apply `action` to every item, returning results in input order.
    ///
    /// Each batch is polled concurrently on the current task and completes when
    /// all of its members settle. The pacing delay is applied between batches
    /// only, never before the first or after the last.
    pub async fn run<T, F, Fut>(&self, items: Vec<T>, action: F) -> Vec<Fut::Output>
    where
        F: Fn(T) -> Fut,
        Fut: Future,
    {
        let total = items.len();
        let batches = self.batch_sizes(total).len();
        let mut results = Vec::with_capacity(total);
        let mut remaining = items.into_iter();

        for index in 0..batches {
            if index > 0 && !self.pacing.is_zero() {
                tracing::debug!("Pausing {:?} before next batch", self.pacing);
                tokio::time::sleep(self.pacing).await;
            }

            let batch: Vec<Fut> = remaining
                .by_ref()
                .take(self.concurrency.get())
                .map(&action)
                .collect();
            tracing::info!(
                "Batch {}/{}: running {} item(s)",
                index + 1,
                batches,
                batch.len()
            );

            results.extend(join_all(batch).await);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(n: usize) -> BatchExecutor {
        BatchExecutor::new(Concurrency::new(n).unwrap(), Duration::ZERO)
    }

    #[test]
    fn batch_sizes_split_evenly_with_remainder_last() {
        assert_eq!(executor(2).batch_sizes(5), vec![2, 2, 1]);
        assert_eq!(executor(3).batch_sizes(6), vec![3, 3]);
        assert_eq!(executor(1).batch_sizes(2), vec![1, 1]);
        assert!(executor(3).batch_sizes(0).is_empty());
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let results = executor(2)
            .run(vec![1, 2, 3, 4, 5], |n| async move { n * 10 })
            .await;
        assert_eq!(results, vec![10, 20, 30, 40, 50]);
    }

    #[tokio::test]
    async fn empty_input_runs_nothing() {
        let results: Vec<u8> = executor(2).run(Vec::<u8>::new(), |n| async move { n }).await;
        assert!(results.is_empty());
    }
}
