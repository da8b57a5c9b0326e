// glaciertool/src/utils/pool.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Bounded fan-out: at most `limit` spawned tasks run at once. A slot is taken
/// before the task is spawned and released when it finishes. Results are
/// collected by the owner of the pool, so workers never share a buffer.
///
/// Every task is spawned with a fallback value that takes its place in the
/// results if the task panics, so each spawn yields exactly one result.
pub struct BoundedPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<T>,
    fallbacks: HashMap<Id, T>,
    finished: Vec<T>,
    cancel: CancellationToken,
}

/// Returned by `spawn` when the pool stops accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolClosed;

impl<T: Send + 'static> BoundedPool<T> {
    pub fn new(limit: usize, cancel: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            tasks: JoinSet::new(),
            fallbacks: HashMap::new(),
            finished: Vec::new(),
            cancel,
        }
    }

    /// Waits for a free slot, then spawns `task`. Fails without spawning once
    /// the cancellation token fires. `fallback` is returned in place of the
    /// task's output if it panics.
    pub async fn spawn<F>(&mut self, task: F, fallback: T) -> Result<(), PoolClosed>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = tokio::select! {
            biased;

            () = self.cancel.cancelled() => return Err(PoolClosed),
            permit = self.semaphore.clone().acquire_owned() => permit.map_err(|_| PoolClosed)?,
        };

        let handle = self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        });
        self.fallbacks.insert(handle.id(), fallback);
        self.reap();
        Ok(())
    }

    /// Waits for every spawned task and returns one result per spawn, in
    /// completion order.
    pub async fn join(mut self) -> Vec<T> {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.collect(joined);
        }
        self.finished
    }

    // Keeps the join set from growing with the number of submitted tasks.
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.collect(joined);
        }
    }

    fn collect(&mut self, joined: Result<(Id, T), JoinError>) {
        match joined {
            Ok((id, value)) => {
                self.fallbacks.remove(&id);
                self.finished.push(value);
            }
            Err(e) => {
                error!(error = %e, "worker task failed");
                if let Some(fallback) = self.fallbacks.remove(&e.id()) {
                    self.finished.push(fallback);
                }
            }
        }
    }
}
