//! Error types for the Komikku backend.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Main error type for scraping operations.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to parse HTML or JSON content
    #[error("Failed to parse content: {0}")]
    ParseError(String),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Upstream page or resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for ScraperError {
    fn from(err: serde_json::Error) -> Self {
        ScraperError::ParseError(err.to_string())
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for alert delivery.
#[derive(Error, Debug)]
pub enum AlertError {
    /// HTTP request to the alert endpoint failed
    #[error("Alert request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The alert endpoint rejected the message
    #[error("Alert rejected: {0}")]
    Rejected(String),

    /// Alerts are not configured
    #[error("Alerts are not configured")]
    NotConfigured,
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
