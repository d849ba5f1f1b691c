//! Error types for catalog and list processing.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("network failure fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

impl PreprocessError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        PreprocessError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn json(origin: impl std::fmt::Display, source: serde_json::Error) -> Self {
        PreprocessError::Json {
            origin: origin.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
