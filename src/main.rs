//! Glacier Bulk Restore Tool
//!
//! Lists archived objects of an S3 bucket and requests their restore in bulk,
//! leaving a report file per operation.

// glaciertool/src/main.rs
mod config;
mod errors;
mod listing;
mod progress;
mod report;
mod restore;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use config::cli::Cli;
use config::{AppConfig, Operation, StorageSettings};
use listing::ListScope;
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use storage::ObjectStore;
use storage::s3::S3Store;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Main entry point for the restore tool
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; flags and the real environment still apply.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nInterrupt received, writing reports for what has completed (press Ctrl-C again to quit now)...");
        on_interrupt.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Second interrupt, exiting without a report");
            std::process::exit(130);
        }
    });

    let connect = |settings: StorageSettings| async move {
        Arc::new(S3Store::connect(&settings).await) as Arc<dyn ObjectStore>
    };

    match run_app(&cli, connect, cancel).await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("glaciertool=debug,warn")
        } else {
            EnvFilter::new("glaciertool=info,warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Validates the invocation, connects through `connect` and runs the selected
/// operation. Configuration problems are reported before `connect` is called.
async fn run_app<C, Fut>(cli: &Cli, connect: C, cancel: CancellationToken) -> Result<()>
where
    C: FnOnce(StorageSettings) -> Fut,
    Fut: Future<Output = Arc<dyn ObjectStore>>,
{
    let app_config = AppConfig::from_cli(cli).context("Invalid configuration")?;
    info!(
        operation = app_config.operation.name(),
        bucket = %app_config.storage.bucket,
        concurrency = app_config.run.concurrency,
        "starting"
    );

    if let Some(timeout) = app_config.run.timeout {
        arm_timeout(&cancel, timeout);
    }

    let store = connect(app_config.storage.clone()).await;

    match app_config.operation {
        Operation::List(scope) => {
            listing::run_list_flow(store.as_ref(), &app_config, scope, &cancel)
                .await
                .context("Listing failed")?;
        }
        Operation::Restore(params) => {
            let items = listing::run_list_flow(store.as_ref(), &app_config, ListScope::Archival, &cancel)
                .await
                .context("Listing before restore failed; no restore requests were sent")?;
            restore::run_restore_flow(store, &app_config, &items, params, &cancel)
                .await
                .context("Restore process failed")?;
        }
    }
    Ok(())
}

fn arm_timeout(cancel: &CancellationToken, timeout: Duration) {
    let on_timeout = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = on_timeout.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                warn!(seconds = timeout.as_secs(), "timeout reached, cancelling");
                on_timeout.cancel();
            }
        }
    });
}
