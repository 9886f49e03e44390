//! Abstract interface for the pub/sub channel connecting ingestion to the
//! print listener.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Print notifications are the wire payload carried on the channel.
pub mod notification;

/// Publishers push payloads onto a named topic.
pub mod publisher;

/// Subscriptions consume payloads from a named topic.
pub mod subscription;

pub use notification::PrintNotification;
pub use publisher::{Publisher, PublisherError};
pub use subscription::{
    Subscription, SubscriptionError, SubscriptionHandler, SubscriptionHandlerError,
};
