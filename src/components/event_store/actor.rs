use crate::components::schedule_importer::models::{EventFields, LocalEvent, LocalId};
use crate::components::schedule_importer::store::{EventStore, GateStore};
use crate::components::schedule_importer::time::from_unix;
use crate::config::Config;
use crate::error::{store_error, ImporterResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// Redis key constants
pub mod keys {
    pub const NEXT_LOCAL_ID: &str = "wordcamp_importer:next_local_id";
    pub const REMOTE_IDS: &str = "wordcamp_importer:remote_ids";
    pub const LAST_IMPORT: &str = "wordcamp_importer:last_import";
    pub const EVENT_PREFIX: &str = "wordcamp_importer:event:";

    pub fn event(local_id: u64) -> String {
        format!("{}{}", EVENT_PREFIX, local_id)
    }
}

/// The event store actor that owns the Redis connection
pub struct EventStoreActor {
    client: RedisClient,
    connection: Option<MultiplexedConnection>,
    command_rx: mpsc::Receiver<EventStoreCommand>,
}

/// Commands that can be sent to the event store actor
pub enum EventStoreCommand {
    Ping(mpsc::Sender<bool>),
    FindLocalId(i64, mpsc::Sender<ImporterResult<Option<LocalId>>>),
    ListRemoteIds(mpsc::Sender<ImporterResult<HashSet<i64>>>),
    CreateEvent(EventFields, mpsc::Sender<ImporterResult<LocalId>>),
    UpdateEvent(LocalId, EventFields, mpsc::Sender<ImporterResult<()>>),
    SetRemoteId(LocalId, i64, mpsc::Sender<ImporterResult<()>>),
    AssignCategory(LocalId, String, mpsc::Sender<ImporterResult<()>>),
    GetLastImport(mpsc::Sender<ImporterResult<Option<DateTime<Utc>>>>),
    SetLastImport(DateTime<Utc>, mpsc::Sender<ImporterResult<()>>),
    Shutdown,
}

/// Handle for communicating with the event store actor
#[derive(Clone)]
pub struct EventStoreHandle {
    command_tx: mpsc::Sender<EventStoreCommand>,
}

impl EventStoreHandle {
    /// Create a handle that is not connected to any actor
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(mpsc::Sender<T>) -> EventStoreCommand,
    ) -> ImporterResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| store_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| store_error("Response channel closed"))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> ImporterResult<()> {
        let _ = self.command_tx.send(EventStoreCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl EventStore for EventStoreHandle {
    async fn capability_available(&self) -> bool {
        self.request(EventStoreCommand::Ping).await.unwrap_or(false)
    }

    async fn find_local_id_by_remote_id(&self, remote_id: i64) -> ImporterResult<Option<LocalId>> {
        self.request(|tx| EventStoreCommand::FindLocalId(remote_id, tx))
            .await?
    }

    async fn list_known_remote_ids(&self) -> ImporterResult<HashSet<i64>> {
        self.request(EventStoreCommand::ListRemoteIds).await?
    }

    async fn create_event(&self, fields: &EventFields) -> ImporterResult<LocalId> {
        let fields = fields.clone();
        self.request(|tx| EventStoreCommand::CreateEvent(fields, tx))
            .await?
    }

    async fn update_event(&self, local_id: LocalId, fields: &EventFields) -> ImporterResult<()> {
        let fields = fields.clone();
        self.request(|tx| EventStoreCommand::UpdateEvent(local_id, fields, tx))
            .await?
    }

    async fn set_remote_id_meta(&self, local_id: LocalId, remote_id: i64) -> ImporterResult<()> {
        self.request(|tx| EventStoreCommand::SetRemoteId(local_id, remote_id, tx))
            .await?
    }

    async fn assign_category(&self, local_id: LocalId, category: &str) -> ImporterResult<()> {
        let category = category.to_string();
        self.request(|tx| EventStoreCommand::AssignCategory(local_id, category, tx))
            .await?
    }
}

#[async_trait]
impl GateStore for EventStoreHandle {
    async fn last_import_at(&self) -> ImporterResult<Option<DateTime<Utc>>> {
        self.request(EventStoreCommand::GetLastImport).await?
    }

    async fn record_import_at(&self, at: DateTime<Utc>) -> ImporterResult<()> {
        self.request(|tx| EventStoreCommand::SetLastImport(at, tx))
            .await?
    }
}

impl EventStoreActor {
    /// Create a new actor and return its handle
    pub fn new(config: &Config) -> ImporterResult<(Self, EventStoreHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        let client = RedisClient::open(config.redis_url.as_str())
            .map_err(|e| store_error(&format!("Failed to create Redis client: {}", e)))?;

        let actor = Self {
            client,
            connection: None,
            command_rx,
        };

        let handle = EventStoreHandle { command_tx };

        Ok((actor, handle))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Event store actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                EventStoreCommand::Ping(response_tx) => {
                    let result = self.ping().await;
                    let _ = response_tx.send(result).await;
                }
                EventStoreCommand::FindLocalId(remote_id, response_tx) => {
                    let result = self.find_local_id(remote_id).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::ListRemoteIds(response_tx) => {
                    let result = self.list_remote_ids().await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::CreateEvent(fields, response_tx) => {
                    let result = self.create_event(fields).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::UpdateEvent(local_id, fields, response_tx) => {
                    let result = self.update_event(local_id, fields).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::SetRemoteId(local_id, remote_id, response_tx) => {
                    let result = self.set_remote_id(local_id, remote_id).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::AssignCategory(local_id, category, response_tx) => {
                    let result = self.assign_category(local_id, &category).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::GetLastImport(response_tx) => {
                    let result = self.get_last_import().await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::SetLastImport(at, response_tx) => {
                    let result = self.set_last_import(at).await;
                    let _ = response_tx.send(self.checked(result)).await;
                }
                EventStoreCommand::Shutdown => {
                    info!("Event store actor shutting down");
                    break;
                }
            }
        }

        info!("Event store actor shut down");
    }

    /// Drop the cached connection after a failure so the next command reconnects
    fn checked<T>(&mut self, result: ImporterResult<T>) -> ImporterResult<T> {
        if result.is_err() {
            self.connection = None;
        }
        result
    }

    /// Get a redis connection
    async fn connection(&mut self) -> ImporterResult<MultiplexedConnection> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        let connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| store_error(&format!("Failed to connect to Redis: {}", e)))?;

        self.connection = Some(connection.clone());
        Ok(connection)
    }

    async fn ping(&mut self) -> bool {
        let mut conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Event store unreachable: {}", e);
                return false;
            }
        };

        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match pong {
            Ok(_) => true,
            Err(e) => {
                warn!("Event store did not answer PING: {}", e);
                self.connection = None;
                false
            }
        }
    }

    async fn find_local_id(&mut self, remote_id: i64) -> ImporterResult<Option<LocalId>> {
        let mut conn = self.connection().await?;
        let local_id: Option<LocalId> = conn.hget(keys::REMOTE_IDS, remote_id).await?;
        Ok(local_id)
    }

    async fn list_remote_ids(&mut self) -> ImporterResult<HashSet<i64>> {
        let mut conn = self.connection().await?;
        let ids: Vec<i64> = conn.hkeys(keys::REMOTE_IDS).await?;
        Ok(ids.into_iter().collect())
    }

    async fn load_event(conn: &mut MultiplexedConnection, local_id: LocalId) -> ImporterResult<LocalEvent> {
        let json: Option<String> = conn.get(keys::event(local_id)).await?;
        let json = json.ok_or_else(|| store_error(&format!("No event with local ID {}", local_id)))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn save_event(conn: &mut MultiplexedConnection, event: &LocalEvent) -> ImporterResult<()> {
        let json = serde_json::to_string(event)?;
        () = conn.set(keys::event(event.local_id), json).await?;
        Ok(())
    }

    async fn create_event(&mut self, fields: EventFields) -> ImporterResult<LocalId> {
        let mut conn = self.connection().await?;

        let local_id: LocalId = conn.incr(keys::NEXT_LOCAL_ID, 1).await?;
        Self::save_event(&mut conn, &LocalEvent::new(local_id, fields)).await?;

        Ok(local_id)
    }

    async fn update_event(&mut self, local_id: LocalId, fields: EventFields) -> ImporterResult<()> {
        let mut conn = self.connection().await?;

        let mut event = Self::load_event(&mut conn, local_id).await?;
        event.fields = fields;
        Self::save_event(&mut conn, &event).await
    }

    async fn set_remote_id(&mut self, local_id: LocalId, remote_id: i64) -> ImporterResult<()> {
        let mut conn = self.connection().await?;

        let mut event = Self::load_event(&mut conn, local_id).await?;

        // HSETNX keeps the first link
        let linked: bool = conn.hset_nx(keys::REMOTE_IDS, remote_id, local_id).await?;
        if !linked {
            debug!(remote_id, local_id, "WordCamp already linked, keeping existing link");
            return Ok(());
        }

        event.remote_id = Some(remote_id);
        Self::save_event(&mut conn, &event).await
    }

    async fn assign_category(&mut self, local_id: LocalId, category: &str) -> ImporterResult<()> {
        let mut conn = self.connection().await?;

        let mut event = Self::load_event(&mut conn, local_id).await?;
        if event.categories.insert(category.to_string()) {
            Self::save_event(&mut conn, &event).await?;
        }

        Ok(())
    }

    async fn get_last_import(&mut self) -> ImporterResult<Option<DateTime<Utc>>> {
        let mut conn = self.connection().await?;
        let timestamp: Option<i64> = conn.get(keys::LAST_IMPORT).await?;
        Ok(timestamp.and_then(from_unix))
    }

    async fn set_last_import(&mut self, at: DateTime<Utc>) -> ImporterResult<()> {
        let mut conn = self.connection().await?;
        () = conn.set(keys::LAST_IMPORT, at.timestamp()).await?;
        Ok(())
    }
}
