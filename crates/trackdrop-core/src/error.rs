use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Volume {volume} is unreadable: {source}")]
    VolumeUnreadable {
        volume: String,
        source: std::io::Error,
    },

    #[error("Could not parse track file {}: {message}", path.display())]
    TrackParse { path: PathBuf, message: String },

    #[error("Could not serialize track {}: {message}", path.display())]
    TrackSerialize { path: PathBuf, message: String },

    #[error("Malformed operation manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("No item is awaiting annotation")]
    NoActiveItem,

    #[error("No operation is active")]
    NoActiveOperation,

    #[error("Invalid operation name '{0}'")]
    InvalidOperationName(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot create application root {}: {source}", path.display())]
    Bootstrap {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Operation '{0}' already exists")]
    OperationExists(String),

    #[error("Operation '{0}' not found")]
    UnknownOperation(String),
}
