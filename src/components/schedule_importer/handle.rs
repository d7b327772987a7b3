use super::actor::{ImporterActor, ImporterActorHandle};
use super::importer::ScheduleImporter;
use super::models::ImportResult;
use super::store::GateStore;
use crate::error::ImporterResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the schedule importer actor
#[derive(Clone)]
pub struct ScheduleImporterHandle {
    actor_handle: ImporterActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl ScheduleImporterHandle {
    /// Create a new ScheduleImporterHandle and spawn the actor
    pub fn new(importer: ScheduleImporter, gate: Arc<dyn GateStore>, interval: Duration) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = ImporterActor::new(importer, gate, interval);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Import now, regardless of when the last import ran
    pub async fn import(&self) -> ImporterResult<ImportResult> {
        self.actor_handle.import().await
    }

    /// Import only if the last successful import is older than the interval
    pub async fn run_if_due(&self, now: DateTime<Utc>) -> ImporterResult<Option<ImportResult>> {
        self.actor_handle.run_if_due(now).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ImporterResult<()> {
        self.actor_handle.shutdown().await
    }
}
