//! Error handling for the miner
//!
//! The search engine itself is total; everything here comes from template
//! construction, configuration and talking to the chain node.

use thiserror::Error;

/// Result type alias for mining operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the miner
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A template that cannot be laid out in one block
    #[error("Invalid block template: {0}")]
    InvalidTemplate(String),

    /// The chain node answered with something we cannot use
    #[error("Malformed response from chain node: {message}")]
    MalformedResponse { message: String },

    /// The chain node refused a solution
    #[error("Submission rejected: {message}")]
    Submission { message: String },

    /// The blocking search task died
    #[error("Search task failed: {message}")]
    Search { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid template error
    pub fn invalid_template(message: impl Into<String>) -> Self {
        Self::InvalidTemplate(message.into())
    }

    /// Create a malformed response error
    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a submission error
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }

    /// Create a search task error
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Http(_) => "http",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Io(_) => "io",
            Error::Config { .. } => "config",
            Error::InvalidTemplate(_) => "invalid_template",
            Error::MalformedResponse { .. } => "malformed_response",
            Error::Submission { .. } => "submission",
            Error::Search { .. } => "search",
        }
    }
}
