use super::fetch::ScheduleFetcher;
use super::mapping::map_remote_event;
use super::models::{EventFailureKind, ImportResult, ImportSkip, LocalId, MappedEvent};
use super::store::EventStore;
use crate::config::Config;
use crate::error::{Error, ImporterResult};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Pulls the WordCamp feed and upserts every event into the store
pub struct ScheduleImporter {
    fetcher: ScheduleFetcher,
    store: Arc<dyn EventStore>,
    category: String,
}

impl ScheduleImporter {
    pub fn new(fetcher: ScheduleFetcher, store: Arc<dyn EventStore>, category: impl Into<String>) -> Self {
        Self {
            fetcher,
            store,
            category: category.into(),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn EventStore>) -> ImporterResult<Self> {
        let fetcher = ScheduleFetcher::from_config(config)?;
        Ok(Self::new(fetcher, store, config.event_category.clone()))
    }

    /// Run one import pass.
    ///
    /// Never fails: a missing store, a failed fetch or an unparseable feed end the
    /// run with `ImportResult::skipped` set and nothing written. Failures of single
    /// events are collected in `ImportResult::failures` and the pass continues.
    pub async fn import(&self) -> ImportResult {
        if !self.store.capability_available().await {
            warn!("Calendar store is not available, skipping schedule import");
            return ImportResult::skipped(ImportSkip::PrerequisiteMissing);
        }

        let page = match self.fetcher.fetch().await {
            Ok(page) => page,
            Err(Error::Parse(message)) => {
                warn!(url = %self.fetcher.url(), "Skipping schedule import: {}", message);
                return ImportResult::skipped(ImportSkip::ParseFailure);
            }
            Err(e) => {
                warn!(url = %self.fetcher.url(), "Skipping schedule import: {}", e);
                return ImportResult::skipped(ImportSkip::FetchFailure);
            }
        };

        // One lookup for the whole run instead of one per event
        let mut known_ids = match self.store.list_known_remote_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to load imported WordCamp IDs: {}", e);
                return ImportResult::skipped(ImportSkip::StoreFailure);
            }
        };

        let mut result = ImportResult::default();

        for message in page.invalid {
            warn!("{}", message);
            result.record_failure(None, EventFailureKind::InvalidPayload, message);
        }

        for event in &page.events {
            result.processed += 1;

            let mapped = map_remote_event(event);
            for warning in &mapped.warnings {
                warn!(remote_id = mapped.remote_id, "{}", warning);
            }
            result.warnings += mapped.warnings.len();

            self.upsert(&mapped, &mut known_ids, &mut result).await;
        }

        info!("Schedule import finished: {}", result);
        result
    }

    async fn upsert(&self, mapped: &MappedEvent, known_ids: &mut HashSet<i64>, result: &mut ImportResult) {
        let remote_id = mapped.remote_id;

        let local_id = if known_ids.contains(&remote_id) {
            self.update_existing(mapped, result).await
        } else {
            self.create_new(mapped, known_ids, result).await
        };

        let Some(local_id) = local_id else {
            return;
        };

        if let Err(e) = self.store.assign_category(local_id, &self.category).await {
            error!(remote_id, local_id, "Failed to assign category {}: {}", self.category, e);
            result.record_failure(Some(remote_id), EventFailureKind::CategoryFailed, e.to_string());
        }
    }

    async fn update_existing(&self, mapped: &MappedEvent, result: &mut ImportResult) -> Option<LocalId> {
        let remote_id = mapped.remote_id;

        let local_id = match self.store.find_local_id_by_remote_id(remote_id).await {
            Ok(Some(local_id)) => local_id,
            Ok(None) => {
                warn!(remote_id, "Imported WordCamp has no local event anymore");
                result.record_failure(
                    Some(remote_id),
                    EventFailureKind::LocalRecordMissing,
                    "No local event is linked to this WordCamp",
                );
                return None;
            }
            Err(e) => {
                error!(remote_id, "Failed to look up local event: {}", e);
                result.record_failure(Some(remote_id), EventFailureKind::LocalRecordMissing, e.to_string());
                return None;
            }
        };

        match self.store.update_event(local_id, &mapped.fields).await {
            Ok(()) => {
                debug!(remote_id, local_id, "Updated event");
                result.updated += 1;
            }
            Err(e) => {
                error!(remote_id, local_id, "Failed to update event: {}", e);
                result.record_failure(Some(remote_id), EventFailureKind::UpdateFailed, e.to_string());
            }
        }

        // The record exists either way, so it still gets its category
        Some(local_id)
    }

    async fn create_new(
        &self,
        mapped: &MappedEvent,
        known_ids: &mut HashSet<i64>,
        result: &mut ImportResult,
    ) -> Option<LocalId> {
        let remote_id = mapped.remote_id;

        let local_id = match self.store.create_event(&mapped.fields).await {
            Ok(local_id) => local_id,
            Err(e) => {
                error!(remote_id, "Failed to create event: {}", e);
                result.record_failure(Some(remote_id), EventFailureKind::CreateFailed, e.to_string());
                return None;
            }
        };

        debug!(remote_id, local_id, "Created event");
        result.created += 1;

        // A repeat of this ID later in the same feed becomes an update
        known_ids.insert(remote_id);

        if let Err(e) = self.store.set_remote_id_meta(local_id, remote_id).await {
            error!(remote_id, local_id, "Failed to link event to WordCamp: {}", e);
            result.record_failure(Some(remote_id), EventFailureKind::RemoteIdMetaFailed, e.to_string());
        }

        Some(local_id)
    }
}
