use async_trait::async_trait;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use posprint_messaging::{PrintNotification, SubscriptionHandler, SubscriptionHandlerError};
use posprint_printer::{PrintDevice, PrintJob, run_print_job};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur while handling a notification.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The print job failed.
    #[error("print job failed: {0}")]
    Print(String),
}

impl SubscriptionHandlerError for HandlerError {}

/// Turns received notifications into print jobs.
///
/// Undecodable payloads and payloads with an empty `email` or `message` are
/// dropped with a warning and never reach the device. Printing the same
/// notification twice is harmless, so broker redelivery needs no
/// deduplication here.
#[derive(Clone, Debug)]
pub struct PrintHandler<D>
where
    D: PrintDevice,
{
    device: D,
    line_width: usize,
}

impl<D> PrintHandler<D>
where
    D: PrintDevice,
{
    /// Creates a new `PrintHandler` printing to the given device.
    pub const fn new(device: D, line_width: usize) -> Self {
        Self { device, line_width }
    }
}

#[async_trait]
impl<D> SubscriptionHandler for PrintHandler<D>
where
    D: PrintDevice,
{
    type Error = HandlerError;

    async fn handle(&self, topic: String, payload: Bytes) -> Result<(), Self::Error> {
        let notification = match PrintNotification::try_from(payload) {
            Ok(notification) => notification,
            Err(error) => {
                warn!(topic = %topic, error = %error, "skipping undecodable payload");
                return Ok(());
            }
        };

        if notification.email.is_empty() || notification.message.is_empty() {
            warn!(topic = %topic, "skipping payload with missing fields");
            return Ok(());
        }

        let received_at = notification
            .received_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let job = PrintJob::new(
            &notification.email,
            &notification.message,
            &received_at,
            self.line_width,
        );

        run_print_job(&self.device, &job)
            .await
            .map_err(|e| HandlerError::Print(e.to_string()))
    }
}
