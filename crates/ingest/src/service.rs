use crate::Error;
use crate::rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};

use bytes::Bytes;
use chrono::Utc;
use posprint_messaging::{PrintNotification, Publisher};
use posprint_store::{MessageRecord, MessageStore};
use tracing::{info, warn};
use uuid::Uuid;

const MAX_MESSAGE_CHARS: usize = 1024;

/// Options for creating a new `IngestionService`.
pub struct IngestionServiceOptions<S, P>
where
    S: MessageStore,
    P: Publisher,
{
    /// The durable message store.
    pub store: S,

    /// The channel publisher.
    pub publisher: P,

    /// The topic accepted messages are announced on.
    pub topic: String,

    /// Rate-limit settings.
    pub rate_limit: RateLimitConfig,
}

/// Orchestrates one inbound submission: validate, rate-limit, persist,
/// publish.
///
/// No side effects occur before persistence on any failure path. After
/// persistence succeeds, a publish failure leaves a durable record that was
/// never announced; that at-most-once gap is accepted, the store being the
/// system of record.
#[derive(Clone, Debug)]
pub struct IngestionService<S, P>
where
    S: MessageStore,
    P: Publisher,
{
    store: S,
    publisher: P,
    topic: String,
    limiter: RateLimiter<S>,
}

struct ValidSubmission {
    email: String,
    message: String,
}

fn validate_body(body: &str) -> Result<ValidSubmission, Error> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(Error::InvalidJson)?;

    let email = value
        .get("email")
        .and_then(serde_json::Value::as_str)
        .map_or("", str::trim);
    let message = value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map_or("", str::trim);

    if email.is_empty() || message.is_empty() {
        return Err(Error::MissingFields);
    }

    // 1024 characters exactly is allowed; 1025 is not.
    let length = message.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(Error::MessageTooLong(length));
    }

    Ok(ValidSubmission {
        email: email.to_string(),
        message: message.to_string(),
    })
}

impl<S, P> IngestionService<S, P>
where
    S: MessageStore,
    P: Publisher,
{
    /// Creates a new `IngestionService`.
    pub fn new(
        IngestionServiceOptions {
            store,
            publisher,
            topic,
            rate_limit,
        }: IngestionServiceOptions<S, P>,
    ) -> Self {
        let limiter = RateLimiter::new(store.clone(), rate_limit);

        Self {
            store,
            publisher,
            topic,
            limiter,
        }
    }

    /// Processes one raw submission from the given origin.
    ///
    /// On success the message is durably stored and announced on the topic;
    /// nothing sensitive is echoed back.
    pub async fn ingest(&self, body: &str, source_ip: Option<&str>) -> Result<(), Error> {
        let submission = validate_body(body)?;

        let Some(source_ip) = source_ip.filter(|ip| !ip.is_empty()) else {
            warn!("unable to determine source ip for request");
            return Err(Error::OriginUnresolved);
        };

        let now = Utc::now();

        match self
            .limiter
            .check(source_ip, now)
            .await
            .map_err(|e| Error::RateLimitCheck(e.to_string()))?
        {
            RateLimitDecision::Allowed => {}
            RateLimitDecision::Limited(count) => {
                return Err(Error::RateLimited {
                    origin: source_ip.to_string(),
                    count,
                });
            }
        }

        let record = MessageRecord {
            message_id: Uuid::new_v4(),
            received_at: now,
            email: submission.email.clone(),
            source_ip: source_ip.to_string(),
            message: submission.message.clone(),
        };
        let message_id = record.message_id;

        self.store
            .put(record)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        // The notification omits the message id and origin address.
        let notification = PrintNotification {
            email: submission.email,
            message: submission.message,
            received_at: Some(now),
        };
        let payload: Bytes = notification
            .try_into()
            .map_err(|e: serde_json::Error| Error::Publish(e.to_string()))?;

        self.publisher
            .publish(&self.topic, payload)
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        info!(%message_id, source_ip, "message accepted");
        Ok(())
    }
}
