#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the CrimeScope server.
//!
//! Field names are part of the public contract with the front-end and are
//! kept exactly as the page reads them, which is why the casing differs
//! between envelopes.

use chrono::{DateTime, SecondsFormat, Utc};
use crimescope_crime_models::{CategoryDescriptor, RiskTier};
use crimescope_database_models::PredictionRecord;
use serde::{Deserialize, Serialize};

/// Remediation hint attached to every failed prediction.
pub const PREDICT_SUGGESTION: &str = "Ensure all inputs are valid and try again.";

/// Number of model input features reported by `/health`.
pub const FEATURE_COUNT: u32 = 8;

/// The derived part of a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPredictions {
    /// `1` if an arrest is predicted.
    pub arrest: i64,
    /// Category display name.
    pub category: String,
    /// Classifier category id.
    pub category_numeric: i64,
    /// Risk tier of the category.
    pub risk_level: RiskTier,
}

impl ApiPredictions {
    /// Builds the prediction summary for an arrest flag and resolved
    /// category.
    #[must_use]
    pub fn new(arrest: i64, category: &CategoryDescriptor) -> Self {
        Self {
            arrest,
            category: category.name.to_string(),
            category_numeric: category.id,
            risk_level: category.risk_level(),
        }
    }
}

/// `POST /predict` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPredictResponse {
    /// Always `true`.
    pub success: bool,
    /// Model name.
    pub model: String,
    /// Reported model accuracy.
    pub confidence: String,
    /// Wall time spent on the request, e.g. `"0.012s"`.
    pub processing_time: String,
    /// Derived predictions.
    pub predictions: ApiPredictions,
    /// The persisted record.
    pub form_response: PredictionRecord,
}

/// Failure body shared by `/predict` and `/getData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Error text.
    pub error: String,
    /// Remediation hint, only sent for prediction failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ApiErrorResponse {
    /// A failure without a hint.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            suggestion: None,
        }
    }

    /// A prediction failure with the standard hint.
    #[must_use]
    pub fn prediction(error: impl Into<String>) -> Self {
        Self {
            suggestion: Some(PREDICT_SUGGESTION.to_string()),
            ..Self::new(error)
        }
    }
}

/// `GET /getData` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecordsResponse {
    /// Always `true`.
    pub success: bool,
    /// Every stored record.
    pub crime_records: Vec<PredictionRecord>,
    /// Number of records.
    pub total_crime: usize,
}

impl ApiRecordsResponse {
    /// Wraps a record listing.
    #[must_use]
    pub fn new(crime_records: Vec<PredictionRecord>) -> Self {
        Self {
            success: true,
            total_crime: crime_records.len(),
            crime_records,
        }
    }
}

/// `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"healthy"`.
    pub status: String,
    /// When the check ran (RFC 3339, UTC).
    pub timestamp: String,
    /// Model name.
    pub model: String,
    /// Reported model accuracy.
    pub accuracy: String,
    /// Number of model input features.
    pub features: u32,
}

impl ApiHealth {
    /// A healthy status stamped with `now`.
    #[must_use]
    pub fn healthy(now: DateTime<Utc>, model: &str, accuracy: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            model: model.to_string(),
            accuracy: accuracy.to_string(),
            features: FEATURE_COUNT,
        }
    }
}

/// `GET /check-dashboard` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDashboardStatus {
    /// Always `true`; the dashboard is hosted externally.
    pub running: bool,
    /// Dashboard URL.
    pub url: String,
    /// Human-readable status.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use crimescope_crime_models::resolve;
    use serde_json::json;

    use super::*;

    #[test]
    fn predictions_carry_the_risk_tier() {
        let violent = ApiPredictions::new(1, &resolve(4));
        assert_eq!(
            serde_json::to_value(&violent).unwrap(),
            json!({
                "arrest": 1,
                "category": "Violent Crime",
                "category_numeric": 4,
                "risk_level": "Critical",
            })
        );

        let unknown = ApiPredictions::new(0, &resolve(9));
        assert_eq!(unknown.category, "Category 9");
        assert_eq!(unknown.risk_level, RiskTier::Medium);
    }

    #[test]
    fn suggestion_is_omitted_unless_set() {
        let plain = serde_json::to_value(ApiErrorResponse::new("no such table")).unwrap();
        assert_eq!(plain, json!({ "success": false, "error": "no such table" }));

        let predict = serde_json::to_value(ApiErrorResponse::prediction("bad input")).unwrap();
        assert_eq!(predict["suggestion"], PREDICT_SUGGESTION);
    }

    #[test]
    fn records_response_uses_camel_case() {
        let value = serde_json::to_value(ApiRecordsResponse::new(Vec::new())).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "crimeRecords": [], "totalCrime": 0 })
        );
    }

    #[test]
    fn health_timestamp_is_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let health = ApiHealth::healthy(now, "CrimeScope AI v2.0", "91.6%");
        assert_eq!(health.timestamp, "2024-03-01T12:30:00.000Z");
        assert_eq!(health.features, 8);
    }
}
