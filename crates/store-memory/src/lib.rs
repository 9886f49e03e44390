//! In-memory (single node) implementation of message storage for local
//! development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use posprint_store::{MessageRecord, MessageStore};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    records: HashMap<Uuid, MessageRecord>,
    // Secondary index: origin -> received_at -> count at that instant.
    by_origin: HashMap<String, BTreeMap<DateTime<Utc>, u32>>,
}

/// In-memory message store.
#[derive(Clone, Debug, Default)]
pub struct MemoryMessageStore {
    state: Arc<Mutex<State>>,
}

impl MemoryMessageStore {
    /// Creates a new `MemoryMessageStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Returns the record stored under the given id, if any.
    pub async fn get(&self, message_id: Uuid) -> Option<MessageRecord> {
        self.state.lock().await.records.get(&message_id).cloned()
    }

    /// Returns the number of records in the store.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    type Error = Error;

    async fn put(&self, record: MessageRecord) -> Result<(), Self::Error> {
        let mut state = self.state.lock().await;
        *state
            .by_origin
            .entry(record.source_ip.clone())
            .or_default()
            .entry(record.received_at)
            .or_insert(0) += 1;
        state.records.insert(record.message_id, record);
        Ok(())
    }

    async fn count_for_origin_since(
        &self,
        source_ip: &str,
        from: DateTime<Utc>,
    ) -> Result<u32, Self::Error> {
        let state = self.state.lock().await;
        let count = state.by_origin.get(source_ip).map_or(0, |index| {
            index.range(from..).map(|(_, count)| *count).sum()
        });
        Ok(count)
    }
}
