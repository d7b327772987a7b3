use super::models::{EventFields, LocalId};
use crate::error::ImporterResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Calendar store the importer writes events into
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Whether the calendar backend is present and usable
    async fn capability_available(&self) -> bool;

    /// Local record previously created for a remote event
    async fn find_local_id_by_remote_id(&self, remote_id: i64) -> ImporterResult<Option<LocalId>>;

    /// Every remote ID that already has a local record
    async fn list_known_remote_ids(&self) -> ImporterResult<HashSet<i64>>;

    async fn create_event(&self, fields: &EventFields) -> ImporterResult<LocalId>;

    async fn update_event(&self, local_id: LocalId, fields: &EventFields) -> ImporterResult<()>;

    /// Link a local record to its remote event. Write-once: an existing link is kept.
    async fn set_remote_id_meta(&self, local_id: LocalId, remote_id: i64) -> ImporterResult<()>;

    /// Add a category to a record. Adding it twice is a no-op.
    async fn assign_category(&self, local_id: LocalId, category: &str) -> ImporterResult<()>;
}

/// Persistence for the once-per-interval import gate
#[async_trait]
pub trait GateStore: Send + Sync {
    async fn last_import_at(&self) -> ImporterResult<Option<DateTime<Utc>>>;

    async fn record_import_at(&self, at: DateTime<Utc>) -> ImporterResult<()>;
}
