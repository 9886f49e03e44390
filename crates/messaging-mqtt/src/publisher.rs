use crate::{Error, MqttConnectionOptions};

use async_trait::async_trait;
use bytes::Bytes;
use posprint_messaging::Publisher;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Fire-and-forget MQTT publisher.
///
/// Publishes at QoS 0: the payload is handed to the broker without waiting
/// for subscriber receipt. Message loss is acceptable here; the durable store
/// is the system of record.
#[derive(Clone, Debug)]
pub struct MqttPublisher {
    client: AsyncClient,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl MqttPublisher {
    /// Creates a new `MqttPublisher` and starts driving its connection.
    #[must_use]
    pub fn new(options: MqttConnectionOptions) -> Self {
        let mut mqtt_options = MqttOptions::new(options.client_id, options.host, options.port);
        mqtt_options.set_keep_alive(options.keep_alive);
        mqtt_options.set_clean_session(true);

        let (client, mut event_loop) = AsyncClient::new(mqtt_options, 10);

        let shutdown_token = CancellationToken::new();
        let task_tracker = TaskTracker::new();

        // The event loop must be polled for the client to make progress.
        let token = shutdown_token.clone();
        task_tracker.spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    event = event_loop.poll() => {
                        if let Err(error) = event {
                            debug!(error = %error, "publisher event loop error");
                        }
                    }
                }
            }
        });
        task_tracker.close();

        Self {
            client,
            shutdown_token,
            task_tracker,
        }
    }

    /// Disconnects and stops the connection task.
    pub async fn shutdown(&self) {
        let _ = self.client.disconnect().await;
        self.shutdown_token.cancel();
        self.task_tracker.wait().await;
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    type Error = Error;

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), Self::Error> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(Error::Publish)
    }
}
