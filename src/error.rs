//! Error types for gaitkit
//!
//! Only configuration problems are errors. Numerical degeneracies in the
//! data (short bouts, missing leg length, windows past the end of a
//! signal) produce the `NaN` sentinel instead.

use thiserror::Error;

/// Result type alias for gaitkit operations
pub type Result<T> = std::result::Result<T, GaitError>;

/// Main error type for gaitkit operations
#[derive(Error, Debug)]
pub enum GaitError {
    /// Metric graph error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Event or result table error
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error while exporting results
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building or resolving the metric graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The dependency closure of a requested metric contains a cycle
    #[error("Dependency cycle: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    /// A requested metric or a declared dependency is not registered
    #[error("Unknown metric: '{name}'{}", .required_by.as_ref().map(|r| format!(" (required by '{}')", r)).unwrap_or_default())]
    UnknownMetric {
        name: String,
        required_by: Option<String>,
    },

    /// Two descriptors share a name
    #[error("Duplicate metric: '{name}' is already registered")]
    DuplicateMetric { name: String },
}

/// Errors related to the event table and the result table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Column length does not match the number of event rows
    #[error("Length mismatch for '{column}': expected {expected} rows, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A required column is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column was written twice
    #[error("Column already written: {0}")]
    ColumnExists(String),

    /// Rows are not grouped by bout or IC does not increase inside a bout
    #[error("Unordered events at row {row}: {reason}")]
    UnorderedEvents { row: usize, reason: String },
}

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sampling interval must be positive and finite
    #[error("Invalid sampling interval: {0}")]
    InvalidSamplingInterval(f64),

    /// Filter cutoff outside (0, nyquist)
    #[error("Invalid cutoff {cutoff} Hz for nyquist {nyquist} Hz")]
    InvalidCutoff { cutoff: f64, nyquist: f64 },

    /// Filter order of zero
    #[error("Invalid filter order: {0}")]
    InvalidOrder(usize),

    /// FFT length or harmonic count of zero
    #[error("Invalid spectral setting: {0}")]
    InvalidSpectral(String),

    /// Lag window that resolves to fewer than two samples
    #[error("Invalid lag window: {0}")]
    InvalidLagWindow(String),
}
