#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Prediction record row types and case number formatting.
//!
//! A [`PredictionRecord`] is one row of `crime_table`. Rows are serialized
//! with the table's own column names as keys, so the `/getData` listing and
//! the `form_response` of a prediction have the same shape as the
//! externally loaded dataset.

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every generated case number.
pub const CASE_NUMBER_PREFIX: &str = "JK";

/// Zero-padded width of the numeric part of a case number.
pub const CASE_NUMBER_WIDTH: usize = 6;

/// Formats the case number for a record id: `7` becomes `"JK000007"`.
#[must_use]
pub fn format_case_number(id: i64) -> String {
    format!("{CASE_NUMBER_PREFIX}{id:0CASE_NUMBER_WIDTH$}")
}

/// The fields of a record before the store assigns its id and case number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPredictionRecord {
    /// Primary offense type.
    pub primary_type: String,
    /// Offense detail.
    pub description: String,
    /// Location description.
    pub location_description: String,
    /// Predicted arrest flag (0/1).
    pub arrest: i64,
    /// Domestic flag (0/1).
    pub domestic: i64,
    /// Police district.
    pub district: i64,
    /// Display name of the predicted category.
    pub category_name: String,
    /// Day of week.
    pub day_of_week: i64,
    /// Hour of day.
    pub hour_of_day: i64,
    /// `DAY` or `NIGHT`.
    pub day_or_night: String,
}

/// A persisted row of `crime_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Sequential record id.
    #[serde(rename = "ID")]
    pub id: i64,
    /// `JK` + zero-padded id for generated rows.
    #[serde(rename = "Case Number")]
    pub case_number: String,
    /// Primary offense type.
    #[serde(rename = "Primary Type")]
    pub primary_type: String,
    /// Offense detail.
    #[serde(rename = "Description")]
    pub description: String,
    /// Location description.
    #[serde(rename = "Location Description")]
    pub location_description: String,
    /// Arrest flag (0/1).
    #[serde(rename = "Arrest", deserialize_with = "deserialize_flag")]
    pub arrest: i64,
    /// Domestic flag (0/1).
    #[serde(rename = "Domestic", deserialize_with = "deserialize_flag")]
    pub domestic: i64,
    /// Police district.
    #[serde(rename = "District")]
    pub district: i64,
    /// Category name.
    #[serde(rename = "Crime Category")]
    pub category_name: String,
    /// Day of week.
    #[serde(rename = "DayOfWeek")]
    pub day_of_week: i64,
    /// Hour of day.
    #[serde(rename = "HourofDay")]
    pub hour_of_day: i64,
    /// `DAY` or `NIGHT`.
    #[serde(rename = "DayorNight")]
    pub day_or_night: String,
}

impl PredictionRecord {
    /// Combines store-assigned identifiers with the record fields.
    #[must_use]
    pub fn from_new(id: i64, case_number: String, record: NewPredictionRecord) -> Self {
        Self {
            id,
            case_number,
            primary_type: record.primary_type,
            description: record.description,
            location_description: record.location_description,
            arrest: record.arrest,
            domestic: record.domestic,
            district: record.district,
            category_name: record.category_name,
            day_of_week: record.day_of_week,
            hour_of_day: record.hour_of_day,
            day_or_night: record.day_or_night,
        }
    }
}

/// Accepts `0`/`1`, booleans, and `"true"`/`"false"` spellings, which is
/// how flags show up in exported datasets.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(i64::from(b)),
        Flag::Int(i) => Ok(i),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(1),
            "0" | "false" | "" => Ok(0),
            other => Err(serde::de::Error::custom(format!(
                "invalid flag value '{other}'"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewPredictionRecord {
        NewPredictionRecord {
            primary_type: "THEFT".to_string(),
            description: "OVER $500".to_string(),
            location_description: "STREET".to_string(),
            arrest: 0,
            domestic: 0,
            district: 12,
            category_name: "Property Crime".to_string(),
            day_of_week: 0,
            hour_of_day: 14,
            day_or_night: "DAY".to_string(),
        }
    }

    #[test]
    fn case_numbers_are_zero_padded() {
        assert_eq!(format_case_number(7), "JK000007");
        assert_eq!(format_case_number(123_456), "JK123456");
        assert_eq!(format_case_number(1_234_567), "JK1234567");
    }

    #[test]
    fn serializes_with_column_names() {
        let record = PredictionRecord::from_new(7, format_case_number(7), sample());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["ID"], 7);
        assert_eq!(value["Case Number"], "JK000007");
        assert_eq!(value["Primary Type"], "THEFT");
        assert_eq!(value["Crime Category"], "Property Crime");
        assert_eq!(value["HourofDay"], 14);

        let back: PredictionRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn flags_accept_dataset_spellings() {
        let mut value = serde_json::to_value(PredictionRecord::from_new(
            1,
            format_case_number(1),
            sample(),
        ))
        .unwrap();

        value["Arrest"] = serde_json::json!("True");
        value["Domestic"] = serde_json::json!(false);
        let record: PredictionRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.arrest, 1);
        assert_eq!(record.domestic, 0);

        value["Arrest"] = serde_json::json!("maybe");
        assert!(serde_json::from_value::<PredictionRecord>(value).is_err());
    }
}
