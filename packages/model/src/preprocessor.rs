//! Fitted feature transform.
//!
//! An ordered list of per-column transforms. Each one reads a single
//! string column of the [`PredictionInput`] and appends its features to the
//! output vector, so the output layout is the concatenation of the
//! transforms in artifact order.

use std::collections::BTreeSet;

use crimescope_prediction_models::{FeatureColumn, PredictionInput};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// A fitted transform over one input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransform {
    /// One 0/1 feature per fitted level. Unseen levels are rejected.
    OneHot {
        /// Input column.
        column: FeatureColumn,
        /// Fitted levels, in feature order.
        categories: Vec<String>,
    },
    /// `(x - mean) / scale`.
    StandardScaler {
        /// Input column.
        column: FeatureColumn,
        /// Fitted mean.
        mean: f64,
        /// Fitted standard deviation.
        scale: f64,
    },
    /// The value parsed as a number, unchanged.
    Passthrough {
        /// Input column.
        column: FeatureColumn,
    },
}

impl ColumnTransform {
    /// Input column this transform reads.
    #[must_use]
    pub const fn column(&self) -> FeatureColumn {
        match self {
            Self::OneHot { column, .. }
            | Self::StandardScaler { column, .. }
            | Self::Passthrough { column } => *column,
        }
    }

    /// Number of features this transform emits.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::OneHot { categories, .. } => categories.len(),
            Self::StandardScaler { .. } | Self::Passthrough { .. } => 1,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::OneHot { column, categories } => {
                if categories.is_empty() {
                    return Err(invalid(format!("one_hot on '{column}' has no categories")));
                }
                let unique: BTreeSet<&str> = categories.iter().map(String::as_str).collect();
                if unique.len() != categories.len() {
                    return Err(invalid(format!(
                        "one_hot on '{column}' has duplicate categories"
                    )));
                }
            }
            Self::StandardScaler {
                column,
                mean,
                scale,
            } => {
                if !mean.is_finite() || !scale.is_finite() || *scale == 0.0 {
                    return Err(invalid(format!(
                        "standard_scaler on '{column}' has mean {mean} and scale {scale}"
                    )));
                }
            }
            Self::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn apply(&self, value: &str, out: &mut Vec<f64>) -> Result<(), ModelError> {
        match self {
            Self::OneHot { column, categories } => {
                let position = categories.iter().position(|c| c == value).ok_or_else(|| {
                    ModelError::UnknownCategory {
                        column: *column,
                        value: value.to_string(),
                    }
                })?;
                out.extend((0..categories.len()).map(|i| if i == position { 1.0 } else { 0.0 }));
            }
            Self::StandardScaler {
                column,
                mean,
                scale,
            } => {
                out.push((parse_number(*column, value)? - mean) / scale);
            }
            Self::Passthrough { column } => {
                out.push(parse_number(*column, value)?);
            }
        }
        Ok(())
    }
}

/// The fitted feature transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    transformers: Vec<ColumnTransform>,
}

impl Preprocessor {
    /// Creates a transform from its column transforms, in output order.
    #[must_use]
    pub const fn new(transformers: Vec<ColumnTransform>) -> Self {
        Self { transformers }
    }

    /// The column transforms, in output order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnTransform] {
        &self.transformers
    }

    /// Total number of features emitted per input.
    #[must_use]
    pub fn output_width(&self) -> usize {
        self.transformers.iter().map(ColumnTransform::width).sum()
    }

    /// Checks every transform is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidArtifact`] describing the first problem.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.transformers.is_empty() {
            return Err(invalid("feature transform has no columns".to_string()));
        }
        self.transformers
            .iter()
            .try_for_each(ColumnTransform::validate)
    }

    /// Transforms one input record into the classifier's feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for unseen categorical levels or
    /// non-numeric values in numeric columns.
    pub fn transform(&self, input: &PredictionInput) -> Result<Vec<f64>, ModelError> {
        let mut features = Vec::with_capacity(self.output_width());
        for transform in &self.transformers {
            transform.apply(input.value(transform.column()), &mut features)?;
        }
        Ok(features)
    }
}

fn parse_number(column: FeatureColumn, value: &str) -> Result<f64, ModelError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ModelError::InvalidNumber {
            column,
            value: value.to_string(),
        })
}

fn invalid(message: String) -> ModelError {
    ModelError::InvalidArtifact { message }
}
