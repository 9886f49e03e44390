//! MQTT implementation of the messaging crate. The publisher is
//! fire-and-forget (QoS 0); the subscription holds a persistent session
//! (QoS 1, `clean_session = false`) and reconnects on transport loss.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod error;
mod publisher;
mod state;
mod subscription;

pub use error::Error;
pub use publisher::MqttPublisher;
pub use state::ConnectionState;
pub use subscription::{MqttSubscription, MqttSubscriptionOptions};

use std::time::Duration;

/// Options shared by MQTT connections.
#[derive(Clone, Debug)]
pub struct MqttConnectionOptions {
    /// Broker hostname.
    pub host: String,

    /// Broker port.
    pub port: u16,

    /// Stable client identity. Reusing the same id across restarts lets the
    /// broker resume the persistent session.
    pub client_id: String,

    /// Keep-alive interval.
    pub keep_alive: Duration,
}
