use super::models::RemoteEvent;
use crate::config::Config;
use crate::error::{fetch_error, parse_error, ImporterResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Decoded feed body
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    /// Entries in feed order
    pub events: Vec<RemoteEvent>,
    /// Decode errors of entries that are not valid events
    pub invalid: Vec<String>,
}

/// Fetches the WordCamp schedule feed
#[derive(Clone)]
pub struct ScheduleFetcher {
    client: Client,
    url: Url,
}

impl ScheduleFetcher {
    pub fn new(url: Url, timeout: Duration) -> ImporterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| fetch_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, url })
    }

    pub fn from_config(config: &Config) -> ImporterResult<Self> {
        Self::new(config.feed_request_url()?, config.request_timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the feed and decode it.
    /// Network, timeout, status and empty-body problems are `Error::Fetch`; bad JSON is `Error::Parse`.
    pub async fn fetch(&self) -> ImporterResult<FeedPage> {
        debug!(url = %self.url, "Fetching schedule feed");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(&describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(&format!("Feed returned HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(&describe_request_error(&e)))?;

        if body.trim().is_empty() {
            return Err(fetch_error("Feed returned an empty body"));
        }

        debug!(bytes = body.len(), "Received schedule feed");
        parse_feed(&body)
    }
}

fn describe_request_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("Feed request timed out: {}", err)
    } else {
        format!("Network error while fetching feed: {}", err)
    }
}

/// Decode a feed body. Entries that do not decode are collected in `invalid`.
pub fn parse_feed(body: &str) -> ImporterResult<FeedPage> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| parse_error(&format!("Malformed feed JSON: {}", e)))?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(parse_error(&format!(
                "Expected a JSON array of events, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut page = FeedPage::default();
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<RemoteEvent>(entry) {
            Ok(event) => page.events.push(event),
            Err(e) => page
                .invalid
                .push(format!("Feed entry {} is not a valid event: {}", index, e)),
        }
    }

    Ok(page)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
