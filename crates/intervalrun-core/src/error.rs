//! Core error types for intervalrun-core.
//!
//! This module defines the error hierarchy using thiserror. Only planning
//! and configuration errors ever reach a caller: cue delivery failures are
//! absorbed at the dispatch boundary and merely logged.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for intervalrun-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session planning errors
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while turning user input into a segment plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A duration field was non-numeric, non-positive, or rounded to zero seconds.
    #[error("Invalid duration for '{field}': {value}")]
    InvalidDuration { field: DurationField, value: String },

    /// The durations would produce an unreasonably long plan.
    #[error("Plan would have {segments} segments (max {max})")]
    TooManySegments { segments: u64, max: u64 },
}

/// Which of the three session fields a [`PlanError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationField {
    Total,
    Run,
    Walk,
}

impl std::fmt::Display for DurationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DurationField::Total => "total",
            DurationField::Run => "run",
            DurationField::Walk => "walk",
        })
    }
}

/// Failures reported by platform audio/vibration backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// The sound asset could not be loaded
    #[error("Failed to load sound asset '{0}'")]
    AssetLoad(String),

    /// The backend is not available on this platform
    #[error("Cue backend unavailable: {0}")]
    Unavailable(String),

    /// Releasing a sound that the backend no longer knows about
    #[error("Unknown sound handle {0}")]
    UnknownSound(u64),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine or create the data directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
