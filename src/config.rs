use crate::error::{config_error, env_error, ImporterResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default WordCamp Central feed endpoint
pub const DEFAULT_FEED_URL: &str = "https://central.wordcamp.org/wp-json/posts";

/// Category every imported event is tagged with
pub const DEFAULT_EVENT_CATEGORY: &str = "wordcamps";

/// Path of the optional component toggle file
pub const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote schedule feed
    pub feed_url: String,
    /// Post type requested from the feed
    pub post_type: String,
    /// Page size requested from the feed
    pub posts_per_page: u32,
    /// Timeout for the feed request in seconds
    pub request_timeout_secs: u64,
    /// Redis connection URL for the event store
    pub redis_url: String,
    /// Minimum hours between two successful imports
    pub import_interval_hours: u64,
    /// How often the scheduler checks whether an import is due
    pub gate_check_interval_secs: u64,
    /// Category assigned to every imported event
    pub event_category: String,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let mut components = HashMap::new();
        components.insert("schedule_importer".to_string(), true);

        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            post_type: "wordcamp".to_string(),
            posts_per_page: 30,
            request_timeout_secs: 30,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            import_interval_hours: 24,
            gate_check_interval_secs: 3600,
            event_category: DEFAULT_EVENT_CATEGORY.to_string(),
            components,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> ImporterResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let feed_url = env::var("FEED_URL").unwrap_or(defaults.feed_url);
        let post_type = env::var("FEED_POST_TYPE").unwrap_or(defaults.post_type);
        let redis_url = env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        let event_category = env::var("EVENT_CATEGORY").unwrap_or(defaults.event_category);

        // Parse numeric values
        let posts_per_page = parse_var("FEED_POSTS_PER_PAGE", defaults.posts_per_page)?;
        let request_timeout_secs =
            parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        let import_interval_hours =
            parse_var("IMPORT_INTERVAL_HOURS", defaults.import_interval_hours)?;
        let gate_check_interval_secs =
            parse_var("GATE_CHECK_INTERVAL_SECS", defaults.gate_check_interval_secs)?;

        let mut components = defaults.components;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string(COMPONENTS_FILE) {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            // Merge with defaults
            for (key, value) in file_components {
                components.insert(key, value);
            }
        }

        let config = Config {
            feed_url,
            post_type,
            posts_per_page,
            request_timeout_secs,
            redis_url,
            import_interval_hours,
            gate_check_interval_secs,
            event_category,
            components,
        };

        config.feed_request_url()?;

        Ok(config)
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// Full feed URL including the post type and page size filters
    pub fn feed_request_url(&self) -> ImporterResult<Url> {
        let mut url = Url::parse(&self.feed_url)
            .map_err(|e| config_error(&format!("Invalid feed URL {}: {}", self.feed_url, e)))?;

        url.query_pairs_mut()
            .append_pair("type", &self.post_type)
            .append_pair("filter[posts_per_page]", &self.posts_per_page.to_string());

        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn import_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(self.import_interval_hours as i64)
    }

    pub fn gate_check_interval(&self) -> Duration {
        Duration::from_secs(self.gate_check_interval_secs.max(1))
    }
}

/// Read an optional numeric environment variable, falling back to a default
fn parse_var<T: FromStr>(var: &str, default: T) -> ImporterResult<T> {
    match env::var(var) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| env_error(var)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_feed_request_url() {
        let config = Config::default();
        let url = config.feed_request_url().unwrap();

        assert_eq!(url.host_str(), Some("central.wordcamp.org"));
        assert_eq!(url.path(), "/wp-json/posts");

        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("type").map(String::as_str), Some("wordcamp"));
        assert_eq!(
            pairs.get("filter[posts_per_page]").map(String::as_str),
            Some("30")
        );
    }

    #[test]
    fn test_invalid_feed_url() {
        let config = Config {
            feed_url: "not a url".to_string(),
            ..Config::default()
        };

        assert!(matches!(
            config.feed_request_url(),
            Err(crate::error::Error::Config(_))
        ));
    }

    #[test]
    fn test_component_toggles() {
        let mut config = Config::default();
        assert!(config.is_component_enabled("schedule_importer"));
        assert!(!config.is_component_enabled("unknown"));

        config
            .components
            .insert("schedule_importer".to_string(), false);
        assert!(!config.is_component_enabled("schedule_importer"));
    }

    #[test]
    fn test_intervals() {
        let config = Config {
            gate_check_interval_secs: 0,
            ..Config::default()
        };

        assert_eq!(config.import_interval(), chrono::Duration::hours(24));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        // Zero would spin the scheduler loop
        assert_eq!(config.gate_check_interval(), Duration::from_secs(1));
    }
}
