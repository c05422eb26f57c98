//! Error taxonomy shared by the detection, sync and scheduling layers.
//!
//! Detection-layer problems (timeouts, failing readouts, readouts that do not
//! parse) never surface here: they end the arm cycle and stay local.

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The page did not yield a required field; the record is dropped.
    #[error("Extraction incomplete: missing {0}")]
    ExtractionIncomplete(&'static str),

    #[error("GitHub credentials not found; run `connect <token> <owner/repo>` first")]
    CredentialsMissing,

    /// A remote call returned non-success or failed in transport.
    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("No review entry for {0}")]
    UnknownProblem(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::SyncFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
