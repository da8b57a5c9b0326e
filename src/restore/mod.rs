// glaciertool/src/restore/mod.rs
pub(crate) mod logic;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::listing::BucketItem;
use crate::report::{ReportRow, ReportWriter};
use crate::storage::{ObjectStore, RestoreParams};

pub use logic::restore_items;

/// Outcome of one restore request. Exactly one is produced per input item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRequestResult {
    pub key: String,
    pub success: bool,
    /// Empty on success.
    pub error: String,
}

impl RestoreRequestResult {
    pub fn succeeded(key: String) -> Self {
        Self {
            key,
            success: true,
            error: String::new(),
        }
    }

    pub fn failed(key: String, error: impl Into<String>) -> Self {
        Self {
            key,
            success: false,
            error: error.into(),
        }
    }
}

impl ReportRow for RestoreRequestResult {
    const HEADER: &'static [&'static str] = &["key", "success", "error"];

    fn fields(&self) -> Vec<String> {
        vec![self.key.clone(), self.success.to_string(), self.error.clone()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Requests a restore for every item and writes the restore report.
/// Per-item failures are recorded, not returned; only a report failure or a
/// cancellation makes this return an error.
pub async fn run_restore_flow<S: ObjectStore + ?Sized + 'static>(
    store: Arc<S>,
    app_config: &AppConfig,
    items: &[BucketItem],
    params: RestoreParams,
    cancel: &CancellationToken,
) -> Result<RestoreSummary> {
    let bucket = &app_config.storage.bucket;

    let mut report = ReportWriter::create::<RestoreRequestResult>(&app_config.run.output_dir, "restore", bucket)
        .context("Failed to create restore report")?;

    println!(
        "🔄 Restoring {} objects for {} days{}...",
        items.len(),
        params.days,
        params.tier.map(|t| format!(" ({} tier)", t.as_str())).unwrap_or_default()
    );

    let run = restore_items(
        store,
        bucket,
        items,
        params,
        app_config.run.concurrency,
        cancel,
        app_config.run.show_progress,
    )
    .await;
    let outcomes = &run.outcomes;

    report
        .write_rows(outcomes)
        .context("Failed to write restore report")?;
    let report_path = report.finish().context("Failed to flush restore report")?;

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    let summary = RestoreSummary {
        requested: outcomes.len(),
        succeeded,
        failed: outcomes.len() - succeeded,
    };

    println!(
        "✅ Restore requests: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    if summary.failed > 0 {
        eprintln!("⚠️ {} restore requests failed; see the error column of the report", summary.failed);
    }
    println!("📄 Report written to {}", report_path.display());

    if run.was_cancelled() {
        return Err(AppError::Cancelled(format!(
            "restore interrupted; {} of {} requests were not sent and {} were abandoned in flight",
            run.not_sent,
            items.len(),
            run.interrupted
        )))
        .context("Restore did not complete");
    }

    Ok(summary)
}
