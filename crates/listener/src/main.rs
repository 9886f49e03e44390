//! Consumer process: subscribes to the message topic and prints each
//! notification on a network receipt printer.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod handler;

use std::time::Duration;

use clap::Parser;
use handler::PrintHandler;
use posprint_messaging::Subscription;
use posprint_messaging_mqtt::{MqttConnectionOptions, MqttSubscription, MqttSubscriptionOptions};
use posprint_printer::NetworkDevice;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI-specific error type.
#[derive(Debug, thiserror::Error)]
enum Error {
    /// Messaging error.
    #[error(transparent)]
    Messaging(#[from] posprint_messaging_mqtt::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// MQTT broker hostname
    #[arg(long, env = "MQTT_HOST")]
    mqtt_host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883, env = "MQTT_PORT")]
    mqtt_port: u16,

    /// Topic to subscribe to
    #[arg(long, default_value = "posprint/messages", env = "MQTT_TOPIC")]
    mqtt_topic: String,

    /// Printer hostname or address
    #[arg(long, default_value = "192.168.0.5", env = "PRINTER_HOST")]
    printer_host: String,

    /// Printer port
    #[arg(long, default_value_t = 9100, env = "PRINTER_PORT")]
    printer_port: u16,

    /// Printable line width in characters
    #[arg(long, default_value_t = 42, env = "PRINTER_WIDTH")]
    printer_width: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let shutdown_token = CancellationToken::new();

    let signal_shutdown_token = shutdown_token.clone();
    tokio::spawn(async move {
        if cfg!(unix) {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler failed");
            let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler failed");

            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM"),
                _ = sigint.recv() => info!("Received SIGINT"),
            }
        } else {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received interrupt signal");
        }

        info!("Shutting down");
        signal_shutdown_token.cancel();
    });

    let device = NetworkDevice::new(args.printer_host, args.printer_port);
    let print_handler = PrintHandler::new(device, args.printer_width);

    // A stable-enough client id: the broker keys the persistent session on it.
    let client_id = format!(
        "posprint-listener-{}",
        rand::thread_rng().gen_range(0..1_000_000)
    );

    let subscription: MqttSubscription = Subscription::new(
        args.mqtt_topic.clone(),
        MqttSubscriptionOptions {
            connection: MqttConnectionOptions {
                host: args.mqtt_host,
                port: args.mqtt_port,
                client_id,
                keep_alive: Duration::from_secs(60),
            },
        },
        print_handler,
    )
    .await?;

    info!(topic = %args.mqtt_topic, "subscription active, waiting for messages");

    shutdown_token.cancelled().await;

    Subscription::<PrintHandler<NetworkDevice>>::shutdown(&subscription).await;

    Ok(())
}
