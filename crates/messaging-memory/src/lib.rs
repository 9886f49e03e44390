//! In-process implementation of the messaging crate, for local development
//! and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use bytes::Bytes;
use posprint_messaging::{Publisher, Subscription, SubscriptionHandler};
use tokio::sync::{Mutex, broadcast, watch};
use tracing::warn;

static TOPICS: LazyLock<Mutex<HashMap<String, broadcast::Sender<Bytes>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

async fn topic_sender(topic: &str) -> broadcast::Sender<Bytes> {
    TOPICS
        .lock()
        .await
        .entry(topic.to_string())
        .or_insert_with(|| broadcast::channel(100).0)
        .clone()
}

/// In-process publisher. Payloads are dropped when no subscription is
/// listening, matching the at-most-once channel contract.
#[derive(Clone, Debug, Default)]
pub struct MemoryPublisher;

impl MemoryPublisher {
    /// Creates a new `MemoryPublisher`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    type Error = Error;

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), Self::Error> {
        // A send error just means nobody is subscribed.
        let _ = topic_sender(topic).await.send(payload);
        Ok(())
    }
}

/// Options for the in-process subscription (there are none).
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySubscriptionOptions;

/// An in-process subscription.
#[derive(Clone, Debug)]
pub struct MemorySubscription {
    stop_sender: watch::Sender<()>,
}

#[async_trait]
impl<X> Subscription<X> for MemorySubscription
where
    X: SubscriptionHandler,
{
    type Error = Error;

    type Options = MemorySubscriptionOptions;

    async fn new(topic: String, _options: Self::Options, handler: X) -> Result<Self, Self::Error> {
        let mut receiver = topic_sender(&topic).await.subscribe();
        let (stop_sender, mut stop_receiver) = watch::channel(());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_receiver.changed() => break,
                    message = receiver.recv() => {
                        match message {
                            Ok(payload) => {
                                if let Err(error) = handler.handle(topic.clone(), payload).await {
                                    warn!(topic = %topic, error = %error, "handler failed, dropping message");
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(topic = %topic, skipped, "subscription lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });

        Ok(Self { stop_sender })
    }

    async fn shutdown(&self) {
        let _ = self.stop_sender.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use posprint_messaging::SubscriptionHandlerError;
    use serial_test::serial;
    use thiserror::Error;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};

    #[derive(Debug, Error)]
    #[error("handler rejected payload")]
    struct RejectedError;

    impl SubscriptionHandlerError for RejectedError {}

    #[derive(Clone)]
    struct ForwardingHandler {
        sender: mpsc::Sender<Bytes>,
    }

    #[async_trait]
    impl SubscriptionHandler for ForwardingHandler {
        type Error = RejectedError;

        async fn handle(&self, _topic: String, payload: Bytes) -> Result<(), Self::Error> {
            let _ = self.sender.send(payload).await;
            Ok(())
        }
    }

    /// Fails on the first payload, forwards the rest.
    #[derive(Clone)]
    struct FlakyHandler {
        sender: mpsc::Sender<Bytes>,
        seen: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl SubscriptionHandler for FlakyHandler {
        type Error = RejectedError;

        async fn handle(&self, _topic: String, payload: Bytes) -> Result<(), Self::Error> {
            if self.seen.swap(true, std::sync::atomic::Ordering::SeqCst) {
                let _ = self.sender.send(payload).await;
                Ok(())
            } else {
                Err(RejectedError)
            }
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_publish_reaches_subscription() {
        let (sender, mut received) = mpsc::channel(4);
        let subscription: MemorySubscription = Subscription::new(
            "test_publish".to_string(),
            MemorySubscriptionOptions,
            ForwardingHandler { sender },
        )
        .await
        .unwrap();

        MemoryPublisher::new()
            .publish("test_publish", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let payload = timeout(Duration::from_secs(1), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, Bytes::from_static(b"hello"));

        Subscription::<ForwardingHandler>::shutdown(&subscription).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_handler_failure_does_not_stop_delivery() {
        let (sender, mut received) = mpsc::channel(4);
        let subscription: MemorySubscription = Subscription::new(
            "test_flaky".to_string(),
            MemorySubscriptionOptions,
            FlakyHandler {
                sender,
                seen: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
            },
        )
        .await
        .unwrap();

        let publisher = MemoryPublisher::new();
        publisher
            .publish("test_flaky", Bytes::from_static(b"bad"))
            .await
            .unwrap();
        publisher
            .publish("test_flaky", Bytes::from_static(b"good"))
            .await
            .unwrap();

        let payload = timeout(Duration::from_secs(1), received.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload, Bytes::from_static(b"good"));

        Subscription::<FlakyHandler>::shutdown(&subscription).await;
    }
}
