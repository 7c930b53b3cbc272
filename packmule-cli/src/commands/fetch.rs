//! The `fetch` subcommand.

use crate::error::CliError;
use packmule::config::OutputLayout;
use packmule::fetch::{
    AsyncReqwestClient, FetchError, FetchItem, FetchObserver, FetchPipeline,
};
use packmule::project::Artifact;
use packmule::store::GraphStore;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Observer that shows live progress and accumulates errors for the
/// post-run report.
#[derive(Default)]
struct ConsoleObserver {
    errors: Mutex<Vec<FetchError>>,
    last_percent: AtomicU64,
}

impl ConsoleObserver {
    fn take_errors(&self) -> Vec<FetchError> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

impl FetchObserver for ConsoleObserver {
    fn on_progress(&self, completed_bytes: u64, total_bytes: u64) {
        if total_bytes == 0 {
            return;
        }
        let percent = completed_bytes * 100 / total_bytes;
        if self.last_percent.swap(percent, Ordering::AcqRel) != percent {
            print!("\rDownloading... {}%", percent);
            let _ = std::io::stdout().flush();
        }
    }

    fn on_error(&self, error: FetchError) {
        self.errors.lock().unwrap().push(error);
    }

    fn on_success(&self, path: &Path, _artifact: &Artifact) {
        println!("\rFetched {}", path.display());
    }
}

/// Materializes every artifact the store resolves to.
///
/// Per-item errors are accumulated during the run and printed after it,
/// alongside the success summary. Partial failure does not fail the
/// invocation.
pub async fn fetch(dir: &Path, store_path: &Path, retries: u32) -> Result<(), CliError> {
    let store = GraphStore::load(store_path)?;
    let items = FetchItem::from_store(&store);
    if items.is_empty() {
        println!("Nothing to fetch.");
        return Ok(());
    }

    let client = AsyncReqwestClient::new().map_err(CliError::Http)?;
    let pipeline = FetchPipeline::new(Arc::new(client), OutputLayout::new(dir))
        .with_retries(retries);
    let observer = Arc::new(ConsoleObserver::default());

    let summary = pipeline.run(items, observer.clone()).await;

    println!(
        "Fetched {} of {} artifacts ({} bytes); {} skipped.",
        summary.fetched,
        summary.fetched + summary.failed,
        summary.bytes_fetched,
        summary.skipped,
    );
    let errors = observer.take_errors();
    if !errors.is_empty() {
        eprintln!("{} problems:", errors.len());
        for error in errors {
            eprintln!("  {}", error);
        }
    }
    Ok(())
}
