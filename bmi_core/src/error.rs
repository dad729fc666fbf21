//! Error types for the bmi_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bmi_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Measurement outside the accepted range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Degenerate input that would produce NaN or infinity
    #[error("Computation error: {0}")]
    Computation(String),

    /// Network delivery failed
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Local or session storage unavailable
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
