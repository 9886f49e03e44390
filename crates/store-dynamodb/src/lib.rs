//! Implementation of message storage using AWS DynamoDB. Records are keyed by
//! message id, with a global secondary index on `(sourceIp, receivedAt)` for
//! rate-limit range queries.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use chrono::{DateTime, SecondsFormat, Utc};
use posprint_store::{MessageRecord, MessageStore};

/// Options for configuring a `DynamoMessageStore`.
pub struct DynamoMessageStoreOptions {
    /// The AWS region to use.
    pub region: String,

    /// The table holding message records (must be created in advance).
    pub table_name: String,

    /// The global secondary index keyed by `sourceIp` with `receivedAt` as
    /// the range key.
    pub rate_index_name: String,
}

/// Message store backed by AWS DynamoDB.
#[derive(Clone, Debug)]
pub struct DynamoMessageStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
    rate_index_name: String,
}

// DynamoDB compares the GSI range key lexicographically, so timestamps are
// stored as fixed-width RFC 3339 strings in UTC.
fn timestamp_string(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl DynamoMessageStore {
    /// Creates a new `DynamoMessageStore` with the specified options.
    pub async fn new(
        DynamoMessageStoreOptions {
            region,
            table_name,
            rate_index_name,
        }: DynamoMessageStoreOptions,
    ) -> Self {
        let config = aws_config::from_env()
            .region(Region::new(region))
            .load()
            .await;

        Self {
            client: aws_sdk_dynamodb::Client::new(&config),
            table_name,
            rate_index_name,
        }
    }
}

#[async_trait]
impl MessageStore for DynamoMessageStore {
    type Error = Error;

    async fn put(&self, record: MessageRecord) -> Result<(), Self::Error> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(
                "messageId",
                AttributeValue::S(record.message_id.to_string()),
            )
            .item(
                "receivedAt",
                AttributeValue::S(timestamp_string(record.received_at)),
            )
            .item("email", AttributeValue::S(record.email))
            .item("sourceIp", AttributeValue::S(record.source_ip))
            .item("message", AttributeValue::S(record.message))
            .send()
            .await
            .map_err(|e| Error::Put(e.to_string()))?;

        Ok(())
    }

    async fn count_for_origin_since(
        &self,
        source_ip: &str,
        from: DateTime<Utc>,
    ) -> Result<u32, Self::Error> {
        let mut total: u32 = 0;
        let mut exclusive_start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.rate_index_name)
                .key_condition_expression(
                    "#sourceIp = :sourceIp AND #receivedAt >= :windowStart",
                )
                .expression_attribute_names("#sourceIp", "sourceIp")
                .expression_attribute_names("#receivedAt", "receivedAt")
                .expression_attribute_values(
                    ":sourceIp",
                    AttributeValue::S(source_ip.to_string()),
                )
                .expression_attribute_values(
                    ":windowStart",
                    AttributeValue::S(timestamp_string(from)),
                )
                .select(Select::Count)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| Error::Query(e.to_string()))?;

            total = total.saturating_add(output.count().unsigned_abs());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(total)
    }
}
