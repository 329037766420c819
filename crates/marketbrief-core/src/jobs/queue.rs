use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::ai::Throttle;

/// Work queue with bounded concurrency and a minimum delay between task starts
pub struct ThrottledQueue {
    concurrency: usize,
    throttle: Arc<Throttle>,
}

impl ThrottledQueue {
    pub fn new(concurrency: usize, pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            throttle: Arc::new(Throttle::new(pause)),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `task` over every item and collect results in completion order.
    /// Panicked tasks are logged and contribute no result.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, task: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let mut join_set: JoinSet<R> = JoinSet::new();
        let mut results = Vec::with_capacity(items.len());
        let mut pending = items.into_iter();

        loop {
            while join_set.len() < self.concurrency {
                let Some(item) = pending.next() else {
                    break;
                };
                self.throttle.acquire().await;
                join_set.spawn(task(item));
            }

            match join_set.join_next().await {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => tracing::error!("Queued task failed to complete: {}", e),
                None => break,
            }
        }

        results
    }
}
