//! Error types for content loading and extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading and extracting blog content
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("No metadata block found in document")]
    MalformedDocument,

    #[error("Metadata block is not a valid JSON object: {0}")]
    MalformedMetadata(#[source] serde_json::Error),

    #[error("Post manifest {path:?} unavailable: {message}")]
    ManifestUnavailable { path: PathBuf, message: String },

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Config file {path:?} unavailable: {message}")]
    ConfigUnavailable { path: PathBuf, message: String },
}

impl ContentError {
    /// Whether the error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContentError::PostNotFound(_)
                | ContentError::PageNotFound(_)
                | ContentError::MalformedDocument
                | ContentError::MalformedMetadata(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
