use posprint_store::MessageStoreError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Put item failed.
    #[error("failed to put item: {0}")]
    Put(String),

    /// Rate-limit index query failed.
    #[error("failed to query index: {0}")]
    Query(String),
}

impl MessageStoreError for Error {}
