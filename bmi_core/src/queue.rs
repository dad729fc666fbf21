//! Durable queue of submissions that could not be delivered.
//!
//! The queue is a JSON array stored under a single key. Every write
//! replaces the whole array; readers never see a partial update because
//! the underlying store writes atomically.

use crate::payload::SubmissionPayload;
use crate::store::KeyValueStore;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Key of the pending-submission array in the durable store
pub const PENDING_QUEUE_KEY: &str = "bmi_pending_submissions";

/// A payload waiting for a retry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    #[serde(flatten)]
    pub payload: SubmissionPayload,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    pub id: Uuid,
}

/// Queue handle over a key-value store
#[derive(Clone)]
pub struct PendingQueue {
    store: Arc<dyn KeyValueStore>,
}

impl PendingQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read every queued entry
    ///
    /// Unreadable or corrupted contents are logged and treated as an
    /// empty queue.
    pub fn load(&self) -> Vec<PendingSubmission> {
        let contents = match self.store.get(PENDING_QUEUE_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Unable to read pending submissions: {}. Treating as empty.", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<PendingSubmission>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse pending submissions: {}. Treating as empty.",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Replace the stored queue with `entries`
    pub fn save(&self, entries: &[PendingSubmission]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(PENDING_QUEUE_KEY, &json)?;
        tracing::debug!("Saved {} pending submissions", entries.len());
        Ok(())
    }

    /// Append a payload with `attempts = 0`
    pub fn enqueue(&self, payload: SubmissionPayload, saved_at: DateTime<Utc>) -> Result<PendingSubmission> {
        let entry = PendingSubmission {
            payload,
            saved_at,
            attempts: 0,
            id: Uuid::new_v4(),
        };

        let mut entries = self.load();
        entries.push(entry.clone());
        self.save(&entries)?;

        tracing::info!(
            id = %entry.id,
            pending = entries.len(),
            "Saved submission to local queue"
        );
        Ok(entry)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued entry
    pub fn clear(&self) -> Result<()> {
        self.store.remove(PENDING_QUEUE_KEY)?;
        tracing::info!("All pending submissions cleared");
        Ok(())
    }
}
