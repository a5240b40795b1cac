//! Error types for the shopmap core.
//!
//! Nothing in the core is fatal: the map layer degrades to "no new data this
//! cycle". These errors are returned from the lookups and collaborator calls
//! that can fail, and callers either propagate them or fall back locally.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShopMapError>;

#[derive(Debug, Error)]
pub enum ShopMapError {
    /// Input rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cluster identifier not present in the current index
    #[error("No cluster with id {0} in the current index")]
    UnknownCluster(usize),

    /// Configuration failed validation or could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The shop data collaborator failed
    #[error("Shop fetch failed: {0}")]
    Fetch(#[from] crate::source::FetchError),

    /// The backend answered with an application-level error
    #[error("Service error: {0}")]
    Service(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
