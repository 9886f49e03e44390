use posprint_messaging::{PublisherError, SubscriptionError};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
#[error("Messaging error")]
pub struct Error;

impl PublisherError for Error {}
impl SubscriptionError for Error {}
