use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of an event record in the local store
pub type LocalId = u64;

/// Text field of the feed, either a plain string or a `{ "rendered": ... }` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteText {
    Plain(String),
    Rendered { rendered: String },
}

impl Default for RemoteText {
    fn default() -> Self {
        RemoteText::Plain(String::new())
    }
}

impl RemoteText {
    pub fn as_str(&self) -> &str {
        match self {
            RemoteText::Plain(text) => text,
            RemoteText::Rendered { rendered } => rendered,
        }
    }
}

impl From<&str> for RemoteText {
    fn from(text: &str) -> Self {
        RemoteText::Plain(text.to_string())
    }
}

/// A single `post_meta` entry of a feed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One WordCamp as published by the remote feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    #[serde(alias = "ID")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: RemoteText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: RemoteText,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_tz: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_meta: Vec<MetaEntry>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Publication status of a local event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Published,
    Draft,
}

/// Venue sub-record attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
}

/// Fields written to the store on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub title: String,
    pub content: String,
    pub status: EventStatus,
    pub all_day: bool,
    pub timezone: String,
    /// Serialized as `YYYY-MM-DD`
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub url: Option<String>,
    pub venue: Option<Venue>,
}

/// Event record as kept by the local store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalEvent {
    pub local_id: LocalId,
    pub remote_id: Option<i64>,
    pub fields: EventFields,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl LocalEvent {
    pub fn new(local_id: LocalId, fields: EventFields) -> Self {
        Self {
            local_id,
            remote_id: None,
            fields,
            categories: BTreeSet::new(),
        }
    }
}

/// Non-fatal oddities found while mapping a feed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingWarning {
    /// `date_tz` is not a known IANA zone; dates were derived in UTC
    UnknownTimezone(String),
    /// A date meta value was present but not a Unix timestamp
    InvalidDateValue { key: String, value: String },
    /// An End Date was given without a Start Date and was dropped
    EndDateWithoutStart,
    /// The End Date preceded the Start Date and was clamped to it
    EndBeforeStart,
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::UnknownTimezone(tz) => {
                write!(f, "unknown timezone {:?}, using UTC", tz)
            }
            MappingWarning::InvalidDateValue { key, value } => {
                write!(f, "meta {:?} has non-timestamp value {}", key, value)
            }
            MappingWarning::EndDateWithoutStart => {
                write!(f, "end date dropped because there is no start date")
            }
            MappingWarning::EndBeforeStart => {
                write!(f, "end date before start date, clamped to start date")
            }
        }
    }
}

/// Result of mapping one feed event
#[derive(Debug, Clone, PartialEq)]
pub struct MappedEvent {
    pub remote_id: i64,
    pub fields: EventFields,
    pub warnings: Vec<MappingWarning>,
}

/// Reason a whole import run did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSkip {
    PrerequisiteMissing,
    FetchFailure,
    ParseFailure,
    StoreFailure,
}

impl fmt::Display for ImportSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ImportSkip::PrerequisiteMissing => "calendar store unavailable",
            ImportSkip::FetchFailure => "feed fetch failed",
            ImportSkip::ParseFailure => "feed parse failed",
            ImportSkip::StoreFailure => "known event lookup failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFailureKind {
    InvalidPayload,
    CreateFailed,
    UpdateFailed,
    LocalRecordMissing,
    RemoteIdMetaFailed,
    CategoryFailed,
}

/// A single event the run could not fully write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFailure {
    /// `None` when the feed entry could not be decoded at all
    pub remote_id: Option<i64>,
    pub kind: EventFailureKind,
    pub message: String,
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: Option<ImportSkip>,
    pub failures: Vec<EventFailure>,
    pub warnings: usize,
}

impl ImportResult {
    pub fn skipped(reason: ImportSkip) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn record_failure(
        &mut self,
        remote_id: Option<i64>,
        kind: EventFailureKind,
        message: impl Into<String>,
    ) {
        self.failures.push(EventFailure {
            remote_id,
            kind,
            message: message.into(),
        });
    }
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = self.skipped {
            return write!(f, "skipped ({})", reason);
        }
        write!(
            f,
            "{} processed, {} created, {} updated, {} failed, {} warnings",
            self.processed,
            self.created,
            self.updated,
            self.failed(),
            self.warnings
        )
    }
}
