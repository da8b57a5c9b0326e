// glaciertool/src/listing/mod.rs
pub(crate) mod logic;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::report::{ReportRow, ReportWriter};
use crate::storage::{ObjectStore, RemoteObject};

pub use logic::collect_items;

/// Storage classes whose objects must be restored before they can be read.
pub const ARCHIVAL_CLASSES: &[&str] = &["DEEP_ARCHIVE", "GLACIER", "GLACIER_IR"];

/// Which listed objects end up in the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Only objects in `ARCHIVAL_CLASSES`.
    Archival,
    /// Every object.
    All,
}

impl ListScope {
    pub fn admits(&self, storage_class: &str) -> bool {
        match self {
            ListScope::Archival => ARCHIVAL_CLASSES.contains(&storage_class),
            ListScope::All => true,
        }
    }

    pub fn report_name(&self) -> &'static str {
        match self {
            ListScope::Archival => "list",
            ListScope::All => "list_all",
        }
    }
}

/// Metadata snapshot of one listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketItem {
    pub key: String,
    pub owner: String,
    pub storage_class: String,
    pub last_modified: String,
    pub size: i64,
    /// `None` when the provider did not report a restore status.
    pub is_restoring: Option<bool>,
}

impl BucketItem {
    /// Converts a listed object, or `None` when `scope` excludes its storage class.
    pub fn from_remote(object: RemoteObject, scope: ListScope) -> Option<Self> {
        let storage_class = object.storage_class.unwrap_or_default();
        if !scope.admits(&storage_class) {
            return None;
        }
        Some(BucketItem {
            key: object.key.unwrap_or_default(),
            owner: object.owner.unwrap_or_default(),
            storage_class,
            last_modified: object.last_modified.unwrap_or_default(),
            size: object.size.unwrap_or_default(),
            is_restoring: object.restore_in_progress,
        })
    }
}

impl ReportRow for BucketItem {
    const HEADER: &'static [&'static str] =
        &["key", "owner", "storageClass", "lastModified", "size", "isRestoring"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.owner.clone(),
            self.storage_class.clone(),
            self.last_modified.clone(),
            self.size.to_string(),
            self.is_restoring.map(|b| b.to_string()).unwrap_or_default(),
        ]
    }
}

/// Lists the configured bucket, writes the listing report and returns the
/// collected items. The report is written even when the listing stops early;
/// the error is returned afterwards.
pub async fn run_list_flow<S: ObjectStore + ?Sized>(
    store: &S,
    app_config: &AppConfig,
    scope: ListScope,
    cancel: &CancellationToken,
) -> Result<Vec<BucketItem>> {
    let storage = &app_config.storage;

    // Created before the first request so an unwritable directory costs no API calls.
    let mut report = ReportWriter::create::<BucketItem>(&app_config.run.output_dir, scope.report_name(), &storage.bucket)
        .context("Failed to create listing report")?;

    println!(
        "🔍 Listing objects in bucket {}{}...",
        storage.bucket,
        storage
            .prefix
            .as_deref()
            .map(|p| format!(" with prefix '{}'", p))
            .unwrap_or_default()
    );

    let outcome = collect_items(
        store,
        &storage.bucket,
        storage.prefix.as_deref(),
        scope,
        app_config.run.concurrency,
        cancel,
        app_config.run.show_progress,
    )
    .await;

    report
        .write_rows(&outcome.items)
        .context("Failed to write listing report")?;
    let report_path = report.finish().context("Failed to flush listing report")?;

    println!(
        "📋 Total objects: {} (observed {} across {} pages)",
        outcome.items.len(),
        outcome.observed,
        outcome.pages
    );
    println!("📄 Report written to {}", report_path.display());

    match outcome.failure {
        Some(err) => Err(anyhow::Error::new(err).context(format!(
            "Listing of bucket {} stopped after {} pages; the report holds the {} items collected so far",
            storage.bucket,
            outcome.pages,
            outcome.items.len()
        ))),
        None => Ok(outcome.items),
    }
}
