mod actor;
pub mod fetch;
mod handle;
pub mod importer;
pub mod mapping;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod time;

pub use handle::ScheduleImporterHandle;
pub use importer::ScheduleImporter;
pub use models::{ImportResult, ImportSkip};
pub use store::{EventStore, GateStore};

use super::event_store::EventStoreHandle;
use crate::config::Config;
use crate::error::ImporterResult;
use crate::utils::scheduler::Scheduler;
use async_trait::async_trait;
use scheduler::ImportScheduler;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Component that imports the WordCamp schedule once per interval
#[derive(Default)]
pub struct ScheduleImporterComponent {
    handle: RwLock<Option<ScheduleImporterHandle>>,
    scheduler: RwLock<Option<ImportScheduler>>,
}

impl ScheduleImporterComponent {
    /// Create a new schedule importer component
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<ScheduleImporterHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

#[async_trait]
impl super::Component for ScheduleImporterComponent {
    fn name(&self) -> &'static str {
        "schedule_importer"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, store: EventStoreHandle) -> ImporterResult<()> {
        let handle = {
            let mut handle_lock = self.handle.write().await;
            match handle_lock.as_ref() {
                Some(handle) => handle.clone(),
                None => {
                    let config_read = config.read().await;
                    let importer = ScheduleImporter::from_config(&config_read, Arc::new(store.clone()))?;
                    info!(
                        "Schedule importer configured, importing every {} hours",
                        config_read.import_interval_hours
                    );

                    let handle = ScheduleImporterHandle::new(
                        importer,
                        Arc::new(store),
                        config_read.import_interval(),
                    );
                    *handle_lock = Some(handle.clone());
                    handle
                }
            }
        };

        let mut scheduler_lock = self.scheduler.write().await;
        if scheduler_lock.is_none() {
            *scheduler_lock = Some(ImportScheduler::start(config, handle).await?);
        }

        Ok(())
    }

    async fn shutdown(&self) -> ImporterResult<()> {
        // Stop the scheduler first so it does not queue another import
        if let Some(scheduler) = self.scheduler.write().await.take() {
            scheduler.stop().await?;
        }

        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.shutdown().await?;
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
