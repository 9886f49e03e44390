use posprint_messaging::{PublisherError, SubscriptionError};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to hand a publish to the client.
    #[error("failed to publish: {0}")]
    Publish(rumqttc::ClientError),

    /// Failed to issue the initial subscribe.
    #[error("failed to subscribe: {0}")]
    Subscribe(rumqttc::ClientError),
}

impl PublisherError for Error {}
impl SubscriptionError for Error {}
