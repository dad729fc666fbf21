//! Session-scoped result record.
//!
//! The latest calculation is stored as JSON under a fixed key so that later
//! views (result, recommendations) can read it back. Storage failures are
//! reported as `false`/`None`, never as errors.

use crate::store::KeyValueStore;
use crate::{BmiResult, Measurement, Result, TimeEstimate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the serialized [`UserRecord`]
pub const SESSION_DATA_KEY: &str = "bmiData";

/// Key of the companion save timestamp
pub const SESSION_TIMESTAMP_KEY: &str = "bmiTimestamp";

/// Flat keys written by earlier versions; only ever removed
pub const LEGACY_KEYS: [&str; 5] = [
    "bmiHeight",
    "bmiWeight",
    "bmiValue",
    "bmiCategory",
    "bmiCalculated",
];

/// One user's calculation, as handed between views
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub result: BmiResult,
    pub consent: bool,
    pub calculated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<TimeEstimate>,
}

impl UserRecord {
    /// Assess a measurement and wrap it into a record
    pub fn new(measurement: &Measurement, consent: bool, calculated_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            height_cm: measurement.height_cm,
            weight_kg: measurement.weight_kg,
            result: BmiResult::assess(measurement)?,
            consent,
            calculated_at,
            time_estimate: None,
        })
    }

    /// The measurement this record was computed from
    pub fn measurement(&self) -> Measurement {
        Measurement {
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
        }
    }

    /// Attach a time-to-goal estimate toward `target_bmi`
    pub fn with_time_estimate(mut self, target_bmi: f64) -> Self {
        self.time_estimate = Some(TimeEstimate::for_measurement(
            &self.measurement(),
            self.result.category,
            target_bmi,
        ));
        self
    }
}

/// Save the record and its timestamp; returns `false` on storage failure
pub fn save_user_data(store: &dyn KeyValueStore, record: &UserRecord, now: DateTime<Utc>) -> bool {
    let write = || -> Result<()> {
        let json = serde_json::to_string(record)?;
        store.set(SESSION_DATA_KEY, &json)?;
        store.set(SESSION_TIMESTAMP_KEY, &now.to_rfc3339())?;
        Ok(())
    };

    match write() {
        Ok(()) => {
            tracing::info!(bmi = record.result.bmi, "Saved user data to session store");
            true
        }
        Err(e) => {
            tracing::error!("Error saving user data: {}", e);
            false
        }
    }
}

/// Read the stored record; `None` when absent or unreadable
pub fn get_user_data(store: &dyn KeyValueStore) -> Option<UserRecord> {
    let contents = match store.get(SESSION_DATA_KEY) {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            tracing::debug!("No user data in session store");
            return None;
        }
        Err(e) => {
            tracing::error!("Error reading user data: {}", e);
            return None;
        }
    };

    match serde_json::from_str::<UserRecord>(&contents) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("Failed to parse stored user data: {}. Ignoring it.", e);
            None
        }
    }
}

/// Remove the session record and any legacy keys from the durable store
pub fn clear_user_data(session: &dyn KeyValueStore, durable: &dyn KeyValueStore) {
    for key in [SESSION_DATA_KEY, SESSION_TIMESTAMP_KEY] {
        if let Err(e) = session.remove(key) {
            tracing::warn!("Failed to remove '{}': {}", key, e);
        }
    }
    for key in LEGACY_KEYS {
        if let Err(e) = durable.remove(key) {
            tracing::warn!("Failed to remove legacy key '{}': {}", key, e);
        }
    }
    tracing::info!("User data cleared");
}
