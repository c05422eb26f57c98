use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod client;
#[cfg(test)]
pub mod memory;

pub use client::GitHubClient;

/// The remote code repository, addressed by content path (`two-sum/README.md`).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Revision token of the file at `path`, or `None` if there is no such file.
    async fn revision(&self, path: &str) -> Result<Option<String>>;

    /// Whether `path` is a non-empty folder.
    async fn folder_exists(&self, path: &str) -> Result<bool>;

    /// Creates (no revision) or updates (with the current revision) the file at `path`.
    async fn put(&self, path: &str, request: &PutContents) -> Result<()>;
}

/// Body of `PUT /contents/{path}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PutContents {
    pub message: String,
    /// Base64 of the UTF-8 text.
    pub content: String,
    #[serde(rename = "sha", skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl PutContents {
    pub fn new(message: impl Into<String>, text: &str, revision: Option<String>) -> Self {
        Self {
            message: message.into(),
            content: STANDARD.encode(text.as_bytes()),
            revision,
        }
    }

    /// The uploaded text, if `content` is valid base64 of UTF-8.
    pub fn text(&self) -> Option<String> {
        STANDARD
            .decode(&self.content)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }
}

/// The part of a file's metadata we care about.
#[derive(Debug, Deserialize)]
struct FileMetadata {
    sha: String,
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
