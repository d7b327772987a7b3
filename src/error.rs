use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the importer
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(wordcamp_importer::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(wordcamp_importer::config))]
    Config(String),

    #[error("Fetch error: {0}")]
    #[diagnostic(code(wordcamp_importer::fetch))]
    Fetch(String),

    #[error("Parse error: {0}")]
    #[diagnostic(code(wordcamp_importer::parse))]
    Parse(String),

    #[error("Event store error: {0}")]
    #[diagnostic(code(wordcamp_importer::store))]
    Store(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(wordcamp_importer::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(wordcamp_importer::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(wordcamp_importer::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(wordcamp_importer::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Store(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type ImporterResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create parse errors
pub fn parse_error(message: &str) -> Error {
    Error::Parse(message.to_string())
}

/// Helper to create event store errors
pub fn store_error(message: &str) -> Error {
    Error::Store(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create other errors
#[allow(dead_code)]
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
