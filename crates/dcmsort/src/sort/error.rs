//! Error types for the sort engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid test descriptor '{descriptor}': {reason}")]
    Descriptor { descriptor: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("Invalid requirement '{0}': expected n<op><count> with op one of <, <=, =, >, >=")]
    Requirement(String),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Destination escapes the output root: {0}")]
    UnsafeDestination(String),
}

pub type Result<T> = std::result::Result<T, SortError>;
