use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when querying the upstream catalog
///
/// These never leave the catalog client's public operations; they are logged
/// and turned into empty results there.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse catalog response from {url}: {source}")]
    ParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur when reading or writing local key/value storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize stored value: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Errors that can occur while resolving the runtime configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid catalog base URL '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Catalog base URL '{0}' cannot carry query parameters")]
    CannotBeABase(String),
}
