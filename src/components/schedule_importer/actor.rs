use super::importer::ScheduleImporter;
use super::models::ImportResult;
use super::scheduler::run_if_due;
use super::store::GateStore;
use crate::error::{component_error, ImporterResult};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// The importer actor. Commands are handled one at a time, so two imports never overlap.
pub struct ImporterActor {
    importer: ScheduleImporter,
    gate: Arc<dyn GateStore>,
    interval: Duration,
    command_rx: mpsc::Receiver<ImporterCommand>,
}

/// Commands that can be sent to the importer actor
pub enum ImporterCommand {
    RunImport(mpsc::Sender<ImportResult>),
    RunIfDue(DateTime<Utc>, mpsc::Sender<ImporterResult<Option<ImportResult>>>),
    Shutdown,
}

/// Handle for communicating with the importer actor
#[derive(Clone)]
pub struct ImporterActorHandle {
    command_tx: mpsc::Sender<ImporterCommand>,
}

impl ImporterActorHandle {
    /// Run an import right away, ignoring the gate
    pub async fn import(&self) -> ImporterResult<ImportResult> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(ImporterCommand::RunImport(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))
    }

    /// Run an import if the gate allows one at `now`
    pub async fn run_if_due(&self, now: DateTime<Utc>) -> ImporterResult<Option<ImportResult>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(ImporterCommand::RunIfDue(now, response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ImporterResult<()> {
        let _ = self.command_tx.send(ImporterCommand::Shutdown).await;
        Ok(())
    }
}

impl ImporterActor {
    /// Create a new actor and return its handle
    pub fn new(
        importer: ScheduleImporter,
        gate: Arc<dyn GateStore>,
        interval: Duration,
    ) -> (Self, ImporterActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(8);

        let actor = Self {
            importer,
            gate,
            interval,
            command_rx,
        };

        let handle = ImporterActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Schedule importer actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                ImporterCommand::RunImport(response_tx) => {
                    let result = self.importer.import().await;
                    let _ = response_tx.send(result).await;
                }
                ImporterCommand::RunIfDue(now, response_tx) => {
                    let result =
                        run_if_due(&self.importer, self.gate.as_ref(), self.interval, now).await;
                    let _ = response_tx.send(result).await;
                }
                ImporterCommand::Shutdown => {
                    info!("Schedule importer actor shutting down");
                    break;
                }
            }
        }

        info!("Schedule importer actor shut down");
    }
}
