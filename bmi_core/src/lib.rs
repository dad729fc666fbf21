#![forbid(unsafe_code)]

//! Core domain model and submission logic for the BMI calculator.
//!
//! This crate provides:
//! - Domain types (measurements, categories, results, time estimates)
//! - Static category and risk tables
//! - Pure BMI calculations
//! - Storage ports (session record, durable retry queue)
//! - Best-effort submission pipeline with fallback and retry

pub mod types;
pub mod error;
pub mod catalog;
pub mod calculator;
pub mod config;
pub mod logging;
pub mod clock;
pub mod store;
pub mod session;
pub mod payload;
pub mod queue;
pub mod transport;
pub mod pipeline;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{category_definition, category_name, risk_profile, validate_tables};
pub use calculator::{
    classify, comparison_text, compute_bmi, deviation, estimate_time_to_goal,
    ideal_weight_range, percentile, progress_percentage, weight_change_needed, TARGET_BMI,
};
pub use config::Config;
pub use clock::{Clock, FixedClock, SystemClock};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use session::{clear_user_data, get_user_data, save_user_data, UserRecord};
pub use payload::SubmissionPayload;
pub use queue::{PendingQueue, PendingSubmission};
pub use transport::{DeliveryError, FetchTransport, PixelTransport, Transport, TransportKind};
pub use pipeline::{SubmissionOutcome, SubmissionPipeline, SubmissionStatus, SyncReport, TestSubmission};
pub use export::export_pending_csv;
