//! Flat submission payload and its URL encoding.

use crate::catalog::category_name;
use crate::session::UserRecord;
use crate::{Error, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Method tag used by diagnostic submissions
pub const TEST_METHOD: &str = "Test Console Submission";

/// Record sent to the analytics endpoint
///
/// Every value is already a display string; the endpoint stores them as-is.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub timestamp: String,
    pub height: String,
    pub weight: String,
    pub bmi: String,
    pub category: String,
    pub note: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Day-first timestamp as rendered by the id-ID locale
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H.%M.%S";

/// Local timestamp, e.g. `16/10/2026, 14.05.33`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format_timestamp_in(at, &Local)
}

/// Timestamp rendered in an explicit timezone
pub fn format_timestamp_in<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}

impl SubmissionPayload {
    /// Build the payload for a stored calculation
    pub fn from_record(
        record: &UserRecord,
        method: &str,
        metadata: &BTreeMap<String, String>,
        at: DateTime<Utc>,
    ) -> Self {
        let bmi = format!("{:.1}", record.result.bmi);
        Self {
            timestamp: format_timestamp(at),
            height: format!("{:.1}", record.height_cm),
            weight: format!("{:.1}", record.weight_kg),
            category: category_name(record.result.category).to_string(),
            note: format!(
                "BMI: {} | Height: {}cm | Weight: {}kg",
                bmi, record.height_cm, record.weight_kg
            ),
            bmi,
            method: method.to_string(),
            metadata: metadata.clone(),
        }
    }

    /// Build a diagnostic payload, tagged so it can be told apart in the sheet
    pub fn for_test(record: &UserRecord, metadata: &BTreeMap<String, String>, at: DateTime<Utc>) -> Self {
        let mut payload = Self::from_record(record, TEST_METHOD, metadata, at);
        payload.note = format!("Test submission from console | BMI: {}", payload.bmi);
        payload
    }

    /// Query parameters in wire order
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = vec![
            ("timestamp", self.timestamp.as_str()),
            ("height", self.height.as_str()),
            ("weight", self.weight.as_str()),
            ("bmi", self.bmi.as_str()),
            ("category", self.category.as_str()),
            ("note", self.note.as_str()),
            ("method", self.method.as_str()),
        ];
        pairs.extend(self.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        pairs
    }

    /// Endpoint URL with the payload appended as query parameters
    pub fn to_url(&self, endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        Ok(url)
    }
}
