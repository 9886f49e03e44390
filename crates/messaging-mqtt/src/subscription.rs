use crate::state::next_state;
use crate::{ConnectionState, Error, MqttConnectionOptions};

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use posprint_messaging::{Subscription, SubscriptionHandler};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Received payloads queued for the handler so a slow handler never blocks
/// connection housekeeping.
const DISPATCH_CAPACITY: usize = 64;

fn backoff_delay(attempt: u32) -> Duration {
    INITIAL_BACKOFF
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_BACKOFF)
}

/// Options for new MQTT subscriptions.
#[derive(Clone, Debug)]
pub struct MqttSubscriptionOptions {
    /// Broker connection settings. The client id must be stable so the
    /// broker resumes the persistent session on reconnect.
    pub connection: MqttConnectionOptions,
}

/// An MQTT subscription with a persistent session.
///
/// Subscribes at QoS 1 with `clean_session = false`, so the broker may
/// redeliver messages missed while disconnected. Transport loss drives the
/// machine through `Interrupted → Reconnecting` with capped exponential
/// backoff; resubscription on resume is implicit in the session. Only an
/// explicit [`shutdown`](Subscription::shutdown) ends the subscription.
#[derive(Debug)]
pub struct MqttSubscription {
    state_receiver: watch::Receiver<ConnectionState>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl MqttSubscription {
    /// Returns a watch over the connection state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_receiver.clone()
    }

    /// Waits for the subscription tasks to exit.
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }
}

#[async_trait]
impl<X> Subscription<X> for MqttSubscription
where
    X: SubscriptionHandler,
{
    type Error = Error;

    type Options = MqttSubscriptionOptions;

    async fn new(topic: String, options: Self::Options, handler: X) -> Result<Self, Self::Error> {
        let connection = options.connection;

        let (state_sender, state_receiver) = watch::channel(ConnectionState::Connecting);
        let (dispatch_sender, mut dispatch_receiver) =
            mpsc::channel::<(String, Bytes)>(DISPATCH_CAPACITY);

        let shutdown_token = CancellationToken::new();
        let task_tracker = TaskTracker::new();

        // Handler work is serialized here, off the connection task.
        task_tracker.spawn(async move {
            while let Some((message_topic, payload)) = dispatch_receiver.recv().await {
                if let Err(error) = handler.handle(message_topic.clone(), payload).await {
                    warn!(topic = %message_topic, error = %error, "handler failed, dropping message");
                }
            }
        });

        let mut mqtt_options = MqttOptions::new(
            connection.client_id.clone(),
            connection.host.clone(),
            connection.port,
        );
        mqtt_options.set_keep_alive(connection.keep_alive);
        mqtt_options.set_clean_session(false);

        let (client, mut event_loop) = AsyncClient::new(mqtt_options, 100);

        client
            .subscribe(&topic, QoS::AtLeastOnce)
            .await
            .map_err(Error::Subscribe)?;

        let token = shutdown_token.clone();
        task_tracker.spawn(async move {
            let mut failures: u32 = 0;

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        let _ = client.disconnect().await;
                        let _ = state_sender.send(ConnectionState::Disconnected);
                        info!(topic = %topic, "subscription shut down");
                        break;
                    }
                    event = event_loop.poll() => {
                        let previous = *state_sender.borrow();
                        let current = next_state(previous, &event);
                        if current != previous {
                            let _ = state_sender.send(current);
                        }

                        match event {
                            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                                failures = 0;
                                info!(
                                    topic = %topic,
                                    session_present = ack.session_present,
                                    "connected to broker"
                                );
                            }
                            Ok(Event::Incoming(Packet::SubAck(_))) => {
                                debug!(topic = %topic, "subscription acknowledged");
                            }
                            Ok(Event::Incoming(Packet::Publish(publish))) => {
                                let message = (publish.topic, Bytes::from(publish.payload));
                                if dispatch_sender.try_send(message).is_err() {
                                    warn!(topic = %topic, "dispatch queue full, dropping message");
                                }
                            }
                            Ok(_) => {}
                            Err(error) => {
                                warn!(topic = %topic, error = %error, "connection interrupted");
                                let _ = state_sender.send(ConnectionState::Reconnecting);

                                let delay = backoff_delay(failures);
                                failures = failures.saturating_add(1);

                                // Next poll re-establishes the session; the
                                // broker re-applies the subscription.
                                tokio::select! {
                                    () = token.cancelled() => {
                                        let _ = state_sender.send(ConnectionState::Disconnected);
                                        break;
                                    }
                                    () = tokio::time::sleep(delay) => {}
                                }
                            }
                        }
                    }
                }
            }
        });
        task_tracker.close();

        Ok(Self {
            state_receiver,
            shutdown_token,
            task_tracker,
        })
    }

    async fn shutdown(&self) {
        self.shutdown_token.cancel();
        self.task_tracker.wait().await;
    }
}
