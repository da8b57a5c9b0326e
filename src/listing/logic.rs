// glaciertool/src/listing/logic.rs
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BucketItem, ListScope};
use crate::errors::AppError;
use crate::progress::ProgressReporter;
use crate::storage::ObjectStore;
use crate::utils::pool::BoundedPool;

/// Result of one listing pass. `items` is complete when `failure` is `None`;
/// otherwise it holds whatever was converted before the listing stopped.
#[derive(Debug)]
pub struct ListingOutcome {
    pub items: Vec<BucketItem>,
    pub pages: usize,
    /// Objects handed to the conversion workers, before scope filtering.
    pub observed: usize,
    pub failure: Option<AppError>,
}

/// Pages through the bucket listing and fans every object out to a bounded
/// pool of conversion tasks. The next page is requested without waiting for
/// the previous page's tasks; all of them are joined before returning, on
/// success and on failure alike. Item order is not listing order.
pub async fn collect_items<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    prefix: Option<&str>,
    scope: ListScope,
    concurrency: usize,
    cancel: &CancellationToken,
    show_progress: bool,
) -> ListingOutcome {
    let progress = ProgressReporter::spinner(show_progress);
    let mut pool = BoundedPool::new(concurrency, cancel.clone());
    let mut continuation_token: Option<String> = None;
    let mut pages = 0;
    let mut observed = 0;

    let failure = 'pages: loop {
        let page = tokio::select! {
            biased;

            () = cancel.cancelled() => break 'pages Some(cancelled(pages)),
            page = store.list_page(bucket, prefix, continuation_token.as_deref()) => page,
        };

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                warn!(bucket, page = pages + 1, error = %e, "listing page failed");
                break 'pages Some(AppError::Store(e));
            }
        };
        pages += 1;
        debug!(bucket, page = pages, objects = page.objects.len(), "listing page received");

        for object in page.objects {
            if pool
                .spawn(async move { BucketItem::from_remote(object, scope) }, None)
                .await
                .is_err()
            {
                break 'pages Some(cancelled(pages));
            }
            observed += 1;
        }
        progress.set_status(format!("Listing objects... {} seen, {} pages", observed, pages));

        match page.next_token {
            Some(token) => continuation_token = Some(token),
            None => break 'pages None,
        }
    };

    let items: Vec<BucketItem> = pool.join().await.into_iter().flatten().collect();
    progress.finish(format!("Listed {} objects, {} matched", observed, items.len()));

    ListingOutcome {
        items,
        pages,
        observed,
        failure,
    }
}

fn cancelled(pages: usize) -> AppError {
    AppError::Cancelled(format!("listing interrupted after {} pages", pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::{Command, ConnectionArgs, ListArgs, RunArgs};
    use crate::config::{AppConfig, RawJsonConfig};
    use crate::listing::run_list_flow;
    use crate::storage::memory::{MemoryStore, object};
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::Ordering;

    fn mixed_objects(count: usize) -> Vec<crate::storage::RemoteObject> {
        let classes = ["STANDARD", "GLACIER", "DEEP_ARCHIVE", "GLACIER_IR", "STANDARD_IA"];
        (0..count)
            .map(|i| object(&format!("obj-{i:04}"), classes[i % classes.len()]))
            .collect()
    }

    fn keys(items: &[BucketItem]) -> HashSet<String> {
        items.iter().map(|i| i.key.clone()).collect()
    }

    fn test_config(dir: &Path, concurrency: usize) -> AppConfig {
        let command = Command::List(ListArgs {
            connection: ConnectionArgs {
                bucket: Some("media".to_string()),
                region: Some("us-east-1".to_string()),
                access_key: Some("AKIA".to_string()),
                secret_key: Some("secret".to_string()),
                ..Default::default()
            },
            run: RunArgs {
                concurrency,
                file: Some(dir.to_path_buf()),
                timeout_secs: None,
                no_progress: true,
            },
        });
        AppConfig::resolve(&command, &RawJsonConfig::default()).unwrap()
    }

    fn only_report(dir: &Path) -> anyhow::Result<Vec<String>> {
        let entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1, "expected exactly one report file");
        Ok(fs::read_to_string(entries[0].path())?
            .lines()
            .map(str::to_string)
            .collect())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_all_scope_collects_every_object_across_pages() {
        let store = MemoryStore::new(mixed_objects(103), 10);

        let outcome = collect_items(&store, "media", None, ListScope::All, 8, &CancellationToken::new(), false).await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.pages, 11);
        assert_eq!(outcome.observed, 103);
        assert_eq!(outcome.items.len(), 103);
        assert_eq!(keys(&outcome.items).len(), 103);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_archival_scope_keeps_only_cold_classes() {
        let store = MemoryStore::new(mixed_objects(100), 7);

        let outcome = collect_items(&store, "media", None, ListScope::Archival, 4, &CancellationToken::new(), false).await;

        // GLACIER, DEEP_ARCHIVE, GLACIER_IR are 3 of every 5 objects.
        assert_eq!(outcome.items.len(), 60);
        assert_eq!(outcome.observed, 100);
        assert!(outcome.items.iter().all(|i| ListScope::Archival.admits(&i.storage_class)));
    }

    #[tokio::test]
    async fn test_prefix_is_forwarded() {
        let mut objects = mixed_objects(10);
        objects.push(object("keep/a", "GLACIER"));
        objects.push(object("keep/b", "STANDARD"));
        let store = MemoryStore::new(objects, 5);

        let outcome = collect_items(&store, "media", Some("keep/"), ListScope::All, 4, &CancellationToken::new(), false).await;

        assert_eq!(keys(&outcome.items), HashSet::from(["keep/a".to_string(), "keep/b".to_string()]));
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let store = MemoryStore::new(Vec::new(), 10);

        let outcome = collect_items(&store, "media", None, ListScope::All, 4, &CancellationToken::new(), false).await;

        assert!(outcome.failure.is_none());
        assert_eq!(outcome.pages, 1);
        assert!(outcome.items.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_page_failure_returns_items_from_earlier_pages() {
        let store = MemoryStore::new(mixed_objects(50), 10).fail_on_page(3);

        let outcome = collect_items(&store, "media", None, ListScope::All, 4, &CancellationToken::new(), false).await;

        assert!(matches!(outcome.failure, Some(AppError::Store(_))));
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.items.len(), 20);
        let expected: HashSet<String> = (0..20).map(|i| format!("obj-{i:04}")).collect();
        assert_eq!(keys(&outcome.items), expected);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let store = MemoryStore::new(mixed_objects(10), 5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = collect_items(&store, "media", None, ListScope::All, 4, &cancel, false).await;

        assert!(matches!(outcome.failure, Some(AppError::Cancelled(_))));
        assert!(outcome.items.is_empty());
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_flow_writes_one_row_per_item() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path(), 16);
        let store = MemoryStore::new(mixed_objects(45), 10);

        let items = run_list_flow(&store, &config, ListScope::Archival, &CancellationToken::new()).await?;

        let lines = only_report(dir.path())?;
        assert_eq!(lines[0], "key;owner;storageClass;lastModified;size;isRestoring");
        assert_eq!(lines.len() - 1, items.len());
        assert_eq!(items.len(), 27);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_flow_page_failure_writes_partial_report_and_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(dir.path(), 16);
        let store = MemoryStore::new(mixed_objects(40), 10).fail_on_page(2);

        let err = run_list_flow(&store, &config, ListScope::All, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<AppError>(), Some(AppError::Store(_))));
        let lines = only_report(dir.path())?;
        assert_eq!(lines.len() - 1, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_flow_unwritable_directory_fails_without_listing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = test_config(&dir.path().join("missing"), 16);
        let store = MemoryStore::new(mixed_objects(10), 10);

        let result = run_list_flow(&store, &config, ListScope::All, &CancellationToken::new()).await;

        assert!(result.is_err());
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
