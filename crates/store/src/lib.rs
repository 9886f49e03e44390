//! Abstract interface for durable message storage.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker trait for message store errors.
pub trait MessageStoreError: Debug + Error + Send + Sync {}

/// A durably stored message. Immutable once written; the store never updates
/// or deletes records.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MessageRecord {
    /// Unique identifier, generated at ingestion.
    #[serde(rename = "messageId")]
    pub message_id: Uuid,

    /// Ingestion timestamp.
    #[serde(rename = "receivedAt")]
    pub received_at: DateTime<Utc>,

    /// Submitter-provided email address (trimmed, non-empty).
    pub email: String,

    /// Origin identifier used for rate limiting.
    #[serde(rename = "sourceIp")]
    pub source_ip: String,

    /// Free-text message body (trimmed, non-empty).
    pub message: String,
}

/// A trait representing durable message storage with asynchronous operations.
///
/// Implementations must index records by `(source_ip, received_at)` in
/// addition to the primary `message_id` key so that
/// [`count_for_origin_since`](MessageStore::count_for_origin_since) is a
/// range query rather than a scan. A successful `put` must be visible to
/// subsequent counts for the same origin.
#[async_trait]
pub trait MessageStore: Clone + Send + Sync + 'static {
    /// The error type for the store.
    type Error: MessageStoreError;

    /// Stores a message record.
    async fn put(&self, record: MessageRecord) -> Result<(), Self::Error>;

    /// Counts records from the given origin with `received_at >= from`
    /// (inclusive lower bound).
    async fn count_for_origin_since(
        &self,
        source_ip: &str,
        from: DateTime<Utc>,
    ) -> Result<u32, Self::Error>;
}
