use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for publisher errors.
pub trait PublisherError: Debug + Error + Send + Sync {}

/// A trait representing a fire-and-forget publisher for a named topic.
///
/// Delivery is at-most-once: implementations hand the payload to the broker
/// and do not wait for subscriber receipt. The durable store is the system of
/// record; the channel is a best-effort notification path.
#[async_trait]
pub trait Publisher: Clone + Send + Sync + 'static {
    /// The error type for the publisher.
    type Error: PublisherError;

    /// Publishes the payload to the given topic.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), Self::Error>;
}
