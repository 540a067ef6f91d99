#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Prediction input record and raw field normalization.
//!
//! The `/predict` endpoint accepts any JSON object. [`PredictionInput`]
//! turns it into the fixed eight-column record the feature transform
//! expects: every column present, every value a string, and documented
//! defaults for anything missing. No range validation happens here;
//! an out-of-range district or hour is passed through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Errors produced while normalizing raw request fields.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The request body is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The request body is valid JSON but not an object.
    #[error("Expected a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was received instead.
        found: &'static str,
    },

    /// A column stored as an integer holds a non-integer value.
    #[error("invalid literal for integer column '{column}': '{value}'")]
    NotAnInteger {
        /// Column that failed to parse.
        column: FeatureColumn,
        /// The offending value.
        value: String,
    },
}

/// The eight feature columns, named exactly as the model was trained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FeatureColumn {
    /// Primary offense type (e.g. `THEFT`)
    #[serde(rename = "Primary Type")]
    #[strum(serialize = "Primary Type")]
    PrimaryType,
    /// Offense detail (e.g. `OVER $500`)
    Description,
    /// Where it happened (e.g. `STREET`)
    #[serde(rename = "Location Description")]
    #[strum(serialize = "Location Description")]
    LocationDescription,
    /// `0` or `1`
    Domestic,
    /// Police district, nominally 1-25
    District,
    /// 0-6
    DayOfWeek,
    /// 0-23
    #[serde(rename = "HourofDay")]
    #[strum(serialize = "HourofDay")]
    HourOfDay,
    /// `DAY` or `NIGHT`
    #[serde(rename = "DayorNight")]
    #[strum(serialize = "DayorNight")]
    DayOrNight,
}

impl FeatureColumn {
    /// Value substituted when the column is missing from the request.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::PrimaryType => "THEFT",
            Self::Description => "OVER $500",
            Self::LocationDescription => "STREET",
            Self::Domestic | Self::DayOfWeek => "0",
            Self::District => "12",
            Self::HourOfDay => "14",
            Self::DayOrNight => "DAY",
        }
    }

    /// Returns all variants in model column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PrimaryType,
            Self::Description,
            Self::LocationDescription,
            Self::Domestic,
            Self::District,
            Self::DayOfWeek,
            Self::HourOfDay,
            Self::DayOrNight,
        ]
    }
}

/// One normalized prediction request.
///
/// All values are strings, including the numeric ones, because that is
/// how the feature transform was fitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Primary offense type.
    #[serde(rename = "Primary Type")]
    pub primary_type: String,
    /// Offense detail.
    #[serde(rename = "Description")]
    pub description: String,
    /// Location description.
    #[serde(rename = "Location Description")]
    pub location_description: String,
    /// Domestic flag.
    #[serde(rename = "Domestic")]
    pub domestic: String,
    /// Police district.
    #[serde(rename = "District")]
    pub district: String,
    /// Day of week.
    #[serde(rename = "DayOfWeek")]
    pub day_of_week: String,
    /// Hour of day.
    #[serde(rename = "HourofDay")]
    pub hour_of_day: String,
    /// `DAY` or `NIGHT`.
    #[serde(rename = "DayorNight")]
    pub day_or_night: String,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self::from_map(&Map::new())
    }
}

/// The integer-typed columns of a [`PredictionInput`], parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerFields {
    /// Domestic flag.
    pub domestic: i64,
    /// Police district.
    pub district: i64,
    /// Day of week.
    pub day_of_week: i64,
    /// Hour of day.
    pub hour_of_day: i64,
}

impl PredictionInput {
    /// Builds an input from an arbitrary field map. Unknown keys are
    /// ignored, missing keys (and `null`s) get the column default.
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let field = |column: FeatureColumn| {
            let key: &str = column.as_ref();
            map.get(key)
                .and_then(coerce)
                .unwrap_or_else(|| column.default_value().to_string())
        };

        Self {
            primary_type: field(FeatureColumn::PrimaryType),
            description: field(FeatureColumn::Description),
            location_description: field(FeatureColumn::LocationDescription),
            domestic: field(FeatureColumn::Domestic),
            district: field(FeatureColumn::District),
            day_of_week: field(FeatureColumn::DayOfWeek),
            hour_of_day: field(FeatureColumn::HourOfDay),
            day_or_night: field(FeatureColumn::DayOrNight),
        }
    }

    /// Builds an input from a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::NotAnObject`] if `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Self, NormalizeError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(NormalizeError::NotAnObject {
                found: json_type_name(other),
            }),
        }
    }

    /// Builds an input from a raw request body.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError`] if the body isn't a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, NormalizeError> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_json(&value)
    }

    /// Returns the string value of a column.
    #[must_use]
    pub fn value(&self, column: FeatureColumn) -> &str {
        match column {
            FeatureColumn::PrimaryType => &self.primary_type,
            FeatureColumn::Description => &self.description,
            FeatureColumn::LocationDescription => &self.location_description,
            FeatureColumn::Domestic => &self.domestic,
            FeatureColumn::District => &self.district,
            FeatureColumn::DayOfWeek => &self.day_of_week,
            FeatureColumn::HourOfDay => &self.hour_of_day,
            FeatureColumn::DayOrNight => &self.day_or_night,
        }
    }

    /// Parses a column as an integer, tolerating surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::NotAnInteger`] if the value doesn't parse.
    pub fn integer(&self, column: FeatureColumn) -> Result<i64, NormalizeError> {
        let raw = self.value(column);
        raw.trim()
            .parse()
            .map_err(|_| NormalizeError::NotAnInteger {
                column,
                value: raw.to_string(),
            })
    }

    /// Parses every integer-typed column.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::NotAnInteger`] for the first column that
    /// doesn't parse.
    pub fn integer_fields(&self) -> Result<IntegerFields, NormalizeError> {
        Ok(IntegerFields {
            domestic: self.integer(FeatureColumn::Domestic)?,
            district: self.integer(FeatureColumn::District)?,
            day_of_week: self.integer(FeatureColumn::DayOfWeek)?,
            hour_of_day: self.integer(FeatureColumn::HourOfDay)?,
        })
    }
}

/// Coerces an arbitrary JSON value to the string the model sees.
/// `null` counts as missing.
fn coerce(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let input = PredictionInput::from_json(&json!({})).unwrap();
        assert_eq!(input.primary_type, "THEFT");
        assert_eq!(input.description, "OVER $500");
        assert_eq!(input.location_description, "STREET");
        assert_eq!(input.domestic, "0");
        assert_eq!(input.district, "12");
        assert_eq!(input.day_of_week, "0");
        assert_eq!(input.hour_of_day, "14");
        assert_eq!(input.day_or_night, "DAY");
        assert_eq!(input, PredictionInput::default());
    }

    #[test]
    fn coerces_numbers_and_flags_to_strings() {
        let input = PredictionInput::from_json(&json!({
            "Primary Type": "BATTERY",
            "Domestic": true,
            "District": 8,
            "HourofDay": 22,
            "DayorNight": "NIGHT",
            "Extra": "ignored",
        }))
        .unwrap();

        assert_eq!(input.primary_type, "BATTERY");
        assert_eq!(input.domestic, "1");
        assert_eq!(input.district, "8");
        assert_eq!(input.hour_of_day, "22");
        assert_eq!(input.day_or_night, "NIGHT");
        assert_eq!(input.description, "OVER $500");
    }

    #[test]
    fn null_counts_as_missing() {
        let input = PredictionInput::from_json(&json!({ "District": null })).unwrap();
        assert_eq!(input.district, "12");
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let input =
            PredictionInput::from_json(&json!({ "District": 99, "HourofDay": "31" })).unwrap();
        let ints = input.integer_fields().unwrap();
        assert_eq!(ints.district, 99);
        assert_eq!(ints.hour_of_day, 31);
    }

    #[test]
    fn rejects_non_object_bodies() {
        let err = PredictionInput::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { found: "an array" }));

        assert!(matches!(
            PredictionInput::from_slice(b"not json"),
            Err(NormalizeError::InvalidJson(_))
        ));
    }

    #[test]
    fn integer_fields_reject_garbage() {
        let input = PredictionInput::from_json(&json!({ "DayOfWeek": "Tuesday" })).unwrap();
        let err = input.integer_fields().unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::NotAnInteger {
                column: FeatureColumn::DayOfWeek,
                ..
            }
        ));

        let padded = PredictionInput::from_json(&json!({ "District": " 7 " })).unwrap();
        assert_eq!(padded.integer(FeatureColumn::District).unwrap(), 7);
    }

    #[test]
    fn column_names_match_wire_keys() {
        for column in FeatureColumn::all() {
            let name = column.to_string();
            assert_eq!(name.parse::<FeatureColumn>().unwrap(), *column);
            assert_eq!(
                serde_json::to_value(column).unwrap(),
                Value::String(name.clone())
            );
        }
        assert_eq!(FeatureColumn::HourOfDay.as_ref(), "HourofDay");
    }
}
