use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// Marker trait for subscription errors.
pub trait SubscriptionError: Debug + Error + Send + Sync {}

/// Marker trait for subscription handler errors.
pub trait SubscriptionHandlerError: Debug + Error + Send + Sync {}

/// A trait representing the per-message entry point of a subscription.
///
/// Handlers may be invoked more than once for the same logical message when
/// the broker redelivers under a persistent session, so they must be safe to
/// re-run. A handler failure affects only that message; the subscription
/// keeps delivering.
#[async_trait]
pub trait SubscriptionHandler: Clone + Send + Sync + 'static {
    /// The error type for the handler.
    type Error: SubscriptionHandlerError;

    /// Handles a single payload received on the given topic.
    async fn handle(&self, topic: String, payload: Bytes) -> Result<(), Self::Error>;
}

/// A trait representing a long-lived subscription to a named topic.
#[async_trait]
pub trait Subscription<X>
where
    Self: Send + Sync + Sized + 'static,
    X: SubscriptionHandler,
{
    /// The error type for the subscription.
    type Error: SubscriptionError;

    /// The options for the subscription.
    type Options: Clone + Debug + Send + Sync;

    /// Creates a new subscription delivering each received payload to the
    /// handler.
    async fn new(topic: String, options: Self::Options, handler: X) -> Result<Self, Self::Error>;

    /// Stops the subscription and releases the underlying session.
    async fn shutdown(&self);
}
