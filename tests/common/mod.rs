#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wordcamp_importer::components::schedule_importer::models::{EventFields, LocalEvent, LocalId};
use wordcamp_importer::components::schedule_importer::{EventStore, GateStore, ScheduleImporter};
use wordcamp_importer::config::Config;
use wordcamp_importer::error::{store_error, ImporterResult};

pub const FEED_PATH: &str = "/wp-json/posts";

/// Every call the importer makes against the store, in order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    CapabilityCheck,
    FindLocalId(i64),
    ListRemoteIds,
    Create(EventFields),
    Update(LocalId, EventFields),
    SetRemoteId(LocalId, i64),
    AssignCategory(LocalId, String),
}

#[derive(Debug, Default)]
struct MockState {
    next_id: LocalId,
    events: BTreeMap<LocalId, LocalEvent>,
    remote_ids: HashMap<i64, LocalId>,
    stale_remote_ids: HashSet<i64>,
    failing_titles: HashSet<String>,
    fail_updates: bool,
    calls: Vec<StoreCall>,
}

/// In-memory event store that records calls
#[derive(Debug)]
pub struct MockEventStore {
    available: bool,
    state: Mutex<MockState>,
}

impl MockEventStore {
    pub fn new() -> Self {
        Self {
            available: true,
            state: Mutex::new(MockState::default()),
        }
    }

    /// A store whose calendar backend is missing
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Add an already imported event without recording any calls
    pub async fn seed(&self, remote_id: i64, fields: EventFields) -> LocalId {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let local_id = state.next_id;

        let mut event = LocalEvent::new(local_id, fields);
        event.remote_id = Some(remote_id);
        state.events.insert(local_id, event);
        state.remote_ids.insert(remote_id, local_id);
        local_id
    }

    /// Report a remote ID as known without any local record behind it
    pub async fn add_stale_remote_id(&self, remote_id: i64) {
        self.state.lock().await.stale_remote_ids.insert(remote_id);
    }

    /// Reject creates for events with this title
    pub async fn fail_creates_for(&self, title: &str) {
        self.state.lock().await.failing_titles.insert(title.to_string());
    }

    pub async fn fail_updates(&self) {
        self.state.lock().await.fail_updates = true;
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn events(&self) -> Vec<LocalEvent> {
        self.state.lock().await.events.values().cloned().collect()
    }

    pub async fn event_for_remote(&self, remote_id: i64) -> Option<LocalEvent> {
        let state = self.state.lock().await;
        let local_id = state.remote_ids.get(&remote_id)?;
        state.events.get(local_id).cloned()
    }

    pub async fn count_calls(&self, matches: impl Fn(&StoreCall) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|c| matches(c)).count()
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn capability_available(&self) -> bool {
        self.state.lock().await.calls.push(StoreCall::CapabilityCheck);
        self.available
    }

    async fn find_local_id_by_remote_id(&self, remote_id: i64) -> ImporterResult<Option<LocalId>> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::FindLocalId(remote_id));
        Ok(state.remote_ids.get(&remote_id).copied())
    }

    async fn list_known_remote_ids(&self) -> ImporterResult<HashSet<i64>> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::ListRemoteIds);

        let mut ids: HashSet<i64> = state.remote_ids.keys().copied().collect();
        ids.extend(state.stale_remote_ids.iter().copied());
        Ok(ids)
    }

    async fn create_event(&self, fields: &EventFields) -> ImporterResult<LocalId> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Create(fields.clone()));

        if state.failing_titles.contains(&fields.title) {
            return Err(store_error("create rejected"));
        }

        state.next_id += 1;
        let local_id = state.next_id;
        state.events.insert(local_id, LocalEvent::new(local_id, fields.clone()));
        Ok(local_id)
    }

    async fn update_event(&self, local_id: LocalId, fields: &EventFields) -> ImporterResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::Update(local_id, fields.clone()));

        if state.fail_updates {
            return Err(store_error("update rejected"));
        }

        let event = state
            .events
            .get_mut(&local_id)
            .ok_or_else(|| store_error("no such event"))?;
        event.fields = fields.clone();
        Ok(())
    }

    async fn set_remote_id_meta(&self, local_id: LocalId, remote_id: i64) -> ImporterResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::SetRemoteId(local_id, remote_id));

        if state.remote_ids.contains_key(&remote_id) {
            return Ok(());
        }
        state.remote_ids.insert(remote_id, local_id);
        if let Some(event) = state.events.get_mut(&local_id) {
            event.remote_id = Some(remote_id);
        }
        Ok(())
    }

    async fn assign_category(&self, local_id: LocalId, category: &str) -> ImporterResult<()> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(StoreCall::AssignCategory(local_id, category.to_string()));

        let event = state
            .events
            .get_mut(&local_id)
            .ok_or_else(|| store_error("no such event"))?;
        event.categories.insert(category.to_string());
        Ok(())
    }
}

/// In-memory gate that remembers every recorded import
#[derive(Debug, Default)]
pub struct MockGateStore {
    last_import: Mutex<Option<DateTime<Utc>>>,
    recorded: Mutex<Vec<DateTime<Utc>>>,
}

impl MockGateStore {
    pub fn with_last_import(at: DateTime<Utc>) -> Self {
        Self {
            last_import: Mutex::new(Some(at)),
            ..Default::default()
        }
    }

    pub async fn recorded(&self) -> Vec<DateTime<Utc>> {
        self.recorded.lock().await.clone()
    }
}

#[async_trait]
impl GateStore for MockGateStore {
    async fn last_import_at(&self) -> ImporterResult<Option<DateTime<Utc>>> {
        Ok(*self.last_import.lock().await)
    }

    async fn record_import_at(&self, at: DateTime<Utc>) -> ImporterResult<()> {
        *self.last_import.lock().await = Some(at);
        self.recorded.lock().await.push(at);
        Ok(())
    }
}

/// A feed event in the shape WordCamp Central publishes
pub fn remote_event(id: i64, title: &str, meta: Value) -> Value {
    json!({
        "ID": id,
        "title": title,
        "content": format!("<p>{}</p>", title),
        "date_tz": "America/Chicago",
        "post_meta": meta,
    })
}

/// Serve `body` as the schedule feed
pub async fn mount_feed(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("type", "wordcamp"))
        .and(query_param("filter[posts_per_page]", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub fn test_config(server: &MockServer) -> Config {
    Config {
        feed_url: format!("{}{}", server.uri(), FEED_PATH),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

pub fn importer_for(server: &MockServer, store: Arc<MockEventStore>) -> ScheduleImporter {
    ScheduleImporter::from_config(&test_config(server), store).unwrap()
}
