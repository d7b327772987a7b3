use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration as TokioDuration};
use tracing::{debug, error, info, warn};

use super::handle::ScheduleImporterHandle;
use super::importer::ScheduleImporter;
use super::models::ImportResult;
use super::store::GateStore;
use super::time::is_import_due;
use crate::config::Config;
use crate::error::{component_error, ImporterResult};
use crate::utils::scheduler::Scheduler;

lazy_static! {
    static ref SCHEDULER_RUNNING: AtomicBool = AtomicBool::new(false);
}

/// Run the import if no successful import happened within `interval` before `now`.
///
/// Returns `None` when the gate is closed. The gate is only moved forward by runs
/// that were not skipped, so a failed fetch is retried on the next check.
pub async fn run_if_due(
    importer: &ScheduleImporter,
    gate: &dyn GateStore,
    interval: Duration,
    now: DateTime<Utc>,
) -> ImporterResult<Option<ImportResult>> {
    let last_import = gate.last_import_at().await?;

    if !is_import_due(last_import, now, interval) {
        debug!(?last_import, "Schedule import not due yet");
        return Ok(None);
    }

    let result = importer.import().await;

    if !result.is_skipped() {
        gate.record_import_at(now).await?;
    }

    Ok(Some(result))
}

/// Periodically asks the importer actor to run if the gate is open
pub struct ImportScheduler {
    task: JoinHandle<()>,
}

impl Scheduler for ImportScheduler {
    type Handle = ScheduleImporterHandle;

    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
    ) -> Pin<Box<dyn Future<Output = ImporterResult<Self>> + Send>> {
        Box::pin(async move {
            if SCHEDULER_RUNNING.swap(true, Ordering::SeqCst) {
                warn!("Import scheduler is already running");
                return Err(component_error("Import scheduler is already running"));
            }

            let check_interval = config.read().await.gate_check_interval();
            info!(
                "Starting import scheduler, checking every {} seconds",
                check_interval.as_secs()
            );

            let task = tokio::spawn(run_scheduler_loop(handle, check_interval));

            Ok(ImportScheduler { task })
        })
    }

    fn stop(&self) -> Pin<Box<dyn Future<Output = ImporterResult<()>> + Send + '_>> {
        Box::pin(async move {
            // An import already handed to the actor still completes there
            self.task.abort();
            SCHEDULER_RUNNING.store(false, Ordering::SeqCst);
            info!("Import scheduler stopped");
            Ok(())
        })
    }
}

/// Main scheduler loop
async fn run_scheduler_loop(handle: ScheduleImporterHandle, check_interval: TokioDuration) {
    loop {
        match handle.run_if_due(Utc::now()).await {
            Ok(Some(result)) => info!("Scheduled import ran: {}", result),
            Ok(None) => debug!("No import due"),
            Err(e) => error!("Failed to check import gate: {}", e),
        }

        sleep(check_interval).await;
    }
}
