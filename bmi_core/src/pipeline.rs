//! Best-effort submission of results to the analytics endpoint.
//!
//! A submission tries the primary transport, then the fallback, then parks
//! the payload in the durable queue. Nothing in here returns a transport
//! error to the caller: every failure degrades to "saved locally".
//!
//! Queued entries are retried by [`SubmissionPipeline::sync_pending`] through
//! the primary transport only. An entry that has failed `max_attempts`
//! retries is dropped without further notice.

use crate::clock::{Clock, SystemClock};
use crate::config::SubmissionConfig;
use crate::payload::SubmissionPayload;
use crate::queue::{PendingQueue, PendingSubmission};
use crate::session::UserRecord;
use crate::store::KeyValueStore;
use crate::transport::{
    deliver_with_timeout, FetchTransport, PixelTransport, Transport, TransportKind,
};
use crate::{Measurement, Result};
use reqwest::{Client, Url};
use std::sync::Arc;
use uuid::Uuid;

/// Result of one submission call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A transport reported success
    Delivered { via: TransportKind },
    /// Both transports failed; the payload is in the retry queue
    Queued { id: Uuid },
    /// Both transports failed and the queue could not be written
    Unsaved,
    /// No endpoint configured; nothing was sent or queued
    NotConfigured,
}

impl SubmissionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmissionOutcome::Delivered { .. })
    }
}

/// What the user gets to see about a submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub success: bool,
    pub message: String,
}

impl SubmissionStatus {
    pub fn from_outcome(outcome: &SubmissionOutcome) -> Self {
        match outcome {
            SubmissionOutcome::Delivered { .. } => Self {
                success: true,
                message: "Data Submitted Successfully".into(),
            },
            SubmissionOutcome::Queued { .. } | SubmissionOutcome::Unsaved => Self {
                success: false,
                message: "Data saved locally. Will sync when connection is available.".into(),
            },
            SubmissionOutcome::NotConfigured => Self {
                success: false,
                message: "Submission endpoint not configured".into(),
            },
        }
    }

    /// Status shown when the user declined data collection
    pub fn opted_out() -> Self {
        Self {
            success: false,
            message: "Opted out of data collection".into(),
        }
    }
}

/// Summary of one pass over the retry queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub delivered: usize,
    pub retained: usize,
    pub dropped: usize,
}

/// Diagnostic submission result
#[derive(Clone, Debug)]
pub struct TestSubmission {
    /// URL that can be opened by hand to check the endpoint
    pub url: Url,
    pub outcome: SubmissionOutcome,
}

/// Primary → fallback → queue delivery chain
pub struct SubmissionPipeline {
    settings: SubmissionConfig,
    primary: Box<dyn Transport>,
    fallback: Box<dyn Transport>,
    queue: PendingQueue,
    clock: Arc<dyn Clock>,
}

impl SubmissionPipeline {
    pub fn new(
        settings: SubmissionConfig,
        primary: Box<dyn Transport>,
        fallback: Box<dyn Transport>,
        queue: PendingQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            primary,
            fallback,
            queue,
            clock,
        }
    }

    /// Pipeline over real HTTP transports and the system clock
    pub fn http(settings: SubmissionConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("bmi-calc/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new(
            settings,
            Box::new(PixelTransport::new(client.clone())),
            Box::new(FetchTransport::new(client)),
            PendingQueue::new(store),
            Arc::new(SystemClock),
        ))
    }

    pub fn settings(&self) -> &SubmissionConfig {
        &self.settings
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Payload for a stored calculation, stamped with the current time
    pub fn payload_for(&self, record: &UserRecord) -> SubmissionPayload {
        SubmissionPayload::from_record(
            record,
            &self.settings.method,
            &self.settings.metadata,
            self.clock.now(),
        )
    }

    /// Submit a calculation
    pub async fn submit(&self, record: &UserRecord) -> SubmissionOutcome {
        let payload = self.payload_for(record);
        self.submit_payload(payload).await
    }

    /// Submit an already-built payload through the full chain
    pub async fn submit_payload(&self, payload: SubmissionPayload) -> SubmissionOutcome {
        if !self.settings.is_configured() {
            tracing::error!("Submission endpoint is not configured; skipping submission");
            return SubmissionOutcome::NotConfigured;
        }

        let url = match payload.to_url(&self.settings.endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build submission URL: {}", e);
                return SubmissionOutcome::NotConfigured;
            }
        };

        tracing::info!(method = %self.primary.kind(), "Attempting submission");
        match deliver_with_timeout(self.primary.as_ref(), &url, self.settings.pixel_timeout()).await {
            Ok(()) => {
                tracing::info!(method = %self.primary.kind(), "Data submitted");
                return SubmissionOutcome::Delivered {
                    via: self.primary.kind(),
                };
            }
            Err(e) => tracing::warn!(method = %self.primary.kind(), "Submission failed: {}", e),
        }

        tracing::info!(method = %self.fallback.kind(), "Trying fallback transport");
        match deliver_with_timeout(self.fallback.as_ref(), &url, self.settings.fetch_timeout()).await {
            Ok(()) => {
                tracing::info!(method = %self.fallback.kind(), "Data submitted");
                return SubmissionOutcome::Delivered {
                    via: self.fallback.kind(),
                };
            }
            Err(e) => tracing::warn!(method = %self.fallback.kind(), "Submission failed: {}", e),
        }

        match self.queue.enqueue(payload, self.clock.now()) {
            Ok(entry) => SubmissionOutcome::Queued { id: entry.id },
            Err(e) => {
                tracing::error!("Could not save submission locally: {}", e);
                SubmissionOutcome::Unsaved
            }
        }
    }

    /// Retry every queued entry once through the primary transport
    pub async fn sync_pending(&self) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.settings.is_configured() {
            tracing::debug!("Submission endpoint is not configured; skipping sync");
            return report;
        }

        let entries = self.queue.load();
        if entries.is_empty() {
            return report;
        }
        tracing::info!("Syncing {} pending submissions", entries.len());

        let max_attempts = self.settings.max_attempts;
        let mut remaining = Vec::with_capacity(entries.len());

        for mut entry in entries {
            if entry.attempts >= max_attempts {
                tracing::debug!(id = %entry.id, attempts = entry.attempts, "Dropping submission past retry cap");
                report.dropped += 1;
                continue;
            }

            if self.retry(&entry).await {
                tracing::info!(id = %entry.id, "Synced pending submission");
                report.delivered += 1;
                continue;
            }

            entry.attempts += 1;
            if entry.attempts >= max_attempts {
                tracing::debug!(id = %entry.id, attempts = entry.attempts, "Dropping submission past retry cap");
                report.dropped += 1;
            } else {
                tracing::warn!(id = %entry.id, attempts = entry.attempts, "Failed to sync pending submission");
                report.retained += 1;
                remaining.push(entry);
            }
        }

        if let Err(e) = self.queue.save(&remaining) {
            tracing::warn!("Failed to update pending submissions: {}", e);
        }
        report
    }

    async fn retry(&self, entry: &PendingSubmission) -> bool {
        let url = match entry.payload.to_url(&self.settings.endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(id = %entry.id, "Cannot build retry URL: {}", e);
                return false;
            }
        };

        match deliver_with_timeout(self.primary.as_ref(), &url, self.settings.pixel_timeout()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(id = %entry.id, "Retry failed: {}", e);
                false
            }
        }
    }

    /// Send a tagged diagnostic submission for a height/weight pair
    pub async fn test_submission(&self, height_cm: f64, weight_kg: f64) -> Result<TestSubmission> {
        let measurement = Measurement::new(height_cm, weight_kg)?;
        let record = UserRecord::new(&measurement, true, self.clock.now())?;
        let payload = SubmissionPayload::for_test(&record, &self.settings.metadata, self.clock.now());

        let url = payload.to_url(&self.settings.endpoint)?;
        tracing::info!("Direct test URL: {}", url);

        let outcome = self.submit_payload(payload).await;
        Ok(TestSubmission { url, outcome })
    }

    /// Snapshot of the retry queue
    pub fn pending(&self) -> Vec<PendingSubmission> {
        self.queue.load()
    }

    /// Empty the retry queue
    pub fn clear_pending(&self) -> Result<()> {
        self.queue.clear()
    }
}
