//! Error types for the CRD provider

use std::path::PathBuf;

/// Result type for the provider
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the provider
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// A CRD could not be turned into a resource descriptor
    #[error("Catalog error: {0}")]
    CatalogError(String),

    /// A CRD file could not be read
    #[error("Failed to read {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CRD file could not be parsed
    #[error("Failed to parse {path:?}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Configuration does not match the resource schema
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A manifest could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// No resource type registered under this name
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
