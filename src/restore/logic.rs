// glaciertool/src/restore/logic.rs
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::RestoreRequestResult;
use crate::listing::BucketItem;
use crate::progress::ProgressReporter;
use crate::storage::{ObjectStore, RestoreParams};
use crate::utils::pool::BoundedPool;

/// Error recorded for items skipped because the run was cancelled.
pub const NOT_SENT: &str = "cancelled before the restore request was sent";

/// Error recorded for requests abandoned because the run was cancelled while
/// waiting on the provider.
pub const IN_FLIGHT_CANCELLED: &str = "cancelled while the restore request was in flight";

/// Error recorded when a restore worker dies without producing an outcome.
pub const WORKER_FAILED: &str = "restore worker failed before reporting an outcome";

/// Everything one restore run produced.
#[derive(Debug, Default)]
pub struct RestoreRun {
    /// One outcome per input item, in completion order.
    pub outcomes: Vec<RestoreRequestResult>,
    /// Items never requested because the run was cancelled first.
    pub not_sent: usize,
    /// Requests abandoned while in flight because the run was cancelled.
    pub interrupted: usize,
}

impl RestoreRun {
    /// True when cancellation cut the run short.
    pub fn was_cancelled(&self) -> bool {
        self.not_sent > 0 || self.interrupted > 0
    }
}

enum Attempt {
    Answered(RestoreRequestResult),
    Abandoned(RestoreRequestResult),
}

/// Issues one restore request per item through a bounded pool and returns one
/// outcome per item. When `cancel` fires, queued items are reported as failed
/// without a request and in-flight requests are abandoned, so the call
/// returns promptly even if the provider never answers.
pub async fn restore_items<S: ObjectStore + ?Sized + 'static>(
    store: Arc<S>,
    bucket: &str,
    items: &[BucketItem],
    params: RestoreParams,
    concurrency: usize,
    cancel: &CancellationToken,
    show_progress: bool,
) -> RestoreRun {
    let progress = ProgressReporter::counter(items.len() as u64, show_progress);
    let bucket: Arc<str> = Arc::from(bucket);
    let mut pool = BoundedPool::new(concurrency, cancel.clone());
    let mut run = RestoreRun::default();

    for (submitted, item) in items.iter().enumerate() {
        let store = store.clone();
        let bucket = bucket.clone();
        let progress = progress.clone();
        let cancel = cancel.clone();
        let key = item.key.clone();
        let fallback = Attempt::Answered(RestoreRequestResult::failed(key.clone(), WORKER_FAILED));

        let task = async move {
            let result = tokio::select! {
                biased;

                () = cancel.cancelled() => None,
                result = store.restore_object(&bucket, &key, params) => Some(result),
            };
            progress.inc();
            match result {
                Some(Ok(())) => Attempt::Answered(RestoreRequestResult::succeeded(key)),
                Some(Err(e)) => {
                    debug!(key = %key, error = %e, "restore request failed");
                    Attempt::Answered(RestoreRequestResult::failed(key, e.message()))
                }
                None => Attempt::Abandoned(RestoreRequestResult::failed(key, IN_FLIGHT_CANCELLED)),
            }
        };

        if pool.spawn(task, fallback).await.is_err() {
            warn!(
                submitted,
                remaining = items.len() - submitted,
                "restore cancelled, remaining items will not be requested"
            );
            run.not_sent = items.len() - submitted;
            run.outcomes.extend(
                items[submitted..]
                    .iter()
                    .map(|item| RestoreRequestResult::failed(item.key.clone(), NOT_SENT)),
            );
            break;
        }
    }

    for attempt in pool.join().await {
        match attempt {
            Attempt::Answered(outcome) => run.outcomes.push(outcome),
            Attempt::Abandoned(outcome) => {
                run.interrupted += 1;
                run.outcomes.push(outcome);
            }
        }
    }
    if run.interrupted > 0 {
        warn!(interrupted = run.interrupted, "restore cancelled with requests in flight");
    }
    progress.finish(format!("{} restore requests done", progress.position()));
    run
}
