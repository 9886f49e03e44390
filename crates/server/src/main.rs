//! Ingestion process: HTTP endpoint backed by DynamoDB storage and an MQTT
//! publisher.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use posprint_ingest::{
    HttpServer, IngestionService, IngestionServiceOptions, RateLimitConfig, ServeError,
    create_router,
};
use posprint_messaging_mqtt::{MqttConnectionOptions, MqttPublisher};
use posprint_store_dynamodb::{DynamoMessageStore, DynamoMessageStoreOptions};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI-specific error type.
#[derive(Debug, thiserror::Error)]
enum Error {
    /// HTTP serve error.
    #[error(transparent)]
    Serve(#[from] ServeError),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen for submissions on
    #[arg(long, default_value = "0.0.0.0:8080", env = "POSPRINT_LISTEN_ADDR")]
    listen_addr: SocketAddr,

    /// AWS region for DynamoDB
    #[arg(long, default_value = "us-east-1", env = "AWS_REGION")]
    aws_region: String,

    /// DynamoDB table holding message records
    #[arg(long, env = "DYNAMO_TABLE_NAME")]
    dynamo_table_name: String,

    /// DynamoDB index keyed by source ip and received-at
    #[arg(long, env = "DYNAMO_RATE_INDEX")]
    dynamo_rate_index: String,

    /// Maximum submissions per origin inside the window
    #[arg(long, default_value_t = 10, env = "RATE_LIMIT_MAX_MESSAGES")]
    rate_limit_max_messages: u32,

    /// Rate-limit window in hours
    #[arg(long, default_value_t = 24, env = "RATE_LIMIT_WINDOW_HOURS")]
    rate_limit_window_hours: u32,

    /// MQTT broker hostname
    #[arg(long, env = "MQTT_HOST")]
    mqtt_host: String,

    /// MQTT broker port
    #[arg(long, default_value_t = 1883, env = "MQTT_PORT")]
    mqtt_port: u16,

    /// Topic accepted messages are announced on
    #[arg(long, default_value = "posprint/messages", env = "MQTT_TOPIC")]
    mqtt_topic: String,
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

    let store = DynamoMessageStore::new(DynamoMessageStoreOptions {
        region: args.aws_region,
        table_name: args.dynamo_table_name,
        rate_index_name: args.dynamo_rate_index,
    })
    .await;

    let client_id = format!(
        "posprint-server-{}",
        rand::thread_rng().gen_range(0..1_000_000)
    );
    let publisher = MqttPublisher::new(MqttConnectionOptions {
        host: args.mqtt_host,
        port: args.mqtt_port,
        client_id,
        keep_alive: Duration::from_secs(60),
    });

    let service = IngestionService::new(IngestionServiceOptions {
        store,
        publisher: publisher.clone(),
        topic: args.mqtt_topic,
        rate_limit: RateLimitConfig {
            max_messages: args.rate_limit_max_messages,
            window_hours: args.rate_limit_window_hours,
        },
    });

    let server = HttpServer::new(args.listen_addr);
    let _serve_handle = server.start(create_router(service)).await?;

    shutdown_token.cancelled().await;

    server.shutdown().await;
    publisher.shutdown().await;

    Ok(())
}
