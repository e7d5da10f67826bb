//! Error types for the dashboard.
//!
//! None of these are fatal to the running dashboard: the controller logs them
//! and degrades to a stale or empty display.

use thiserror::Error;

/// Failure to turn a raw stream event into a typed message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown event name: {0}")]
    UnknownEvent(String),

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Failure of a historical query. Swallowed at the history boundary.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("server answered with status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Body(#[from] std::io::Error),
}

/// Failure to construct a chart from a finished series.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("series labels ({labels}) and values ({values}) differ in length")]
    LengthMismatch { labels: usize, values: usize },

    #[error("non-finite value at index {0}")]
    NonFinite(usize),
}

/// Invalid dashboard configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("evolution threshold must be a positive number, got {0}")]
    EvolutionThreshold(f64),

    #[error("activity threshold must lie within [0, 100], got {0}")]
    ActivityThreshold(f64),

    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("server url must start with http:// or https://, got {0}")]
    ServerUrl(String),
}
