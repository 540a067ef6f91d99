#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crime classifier adapter.
//!
//! The trained model is an external collaborator: a fitted feature
//! transform, a fitted multi-output classifier and a fitted category
//! encoder, exported as JSON artifacts. This crate loads them once at
//! startup and exposes a single operation through the [`CrimeClassifier`]
//! trait: turn a [`PredictionInput`] into an arrest flag and a category id.
//!
//! Tests and alternative backends implement [`CrimeClassifier`] directly.

pub mod encoder;
pub mod forest;
pub mod preprocessor;

use std::path::{Path, PathBuf};

use crimescope_prediction_models::{FeatureColumn, PredictionInput};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::encoder::LabelEncoder;
use crate::forest::MultiOutputForest;
use crate::preprocessor::Preprocessor;

/// Display name of the deployed model.
pub const MODEL_NAME: &str = "CrimeScope AI v2.0";

/// Hold-out accuracy reported for the deployed model.
pub const MODEL_ACCURACY: &str = "91.6%";

/// Category id used when a flat prediction carries only the arrest flag.
pub const FALLBACK_CATEGORY_ID: i64 = 1;

/// Errors from loading or running the model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An artifact file could not be read.
    #[error("Failed to read model artifact {}: {source}", .path.display())]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact file is not valid JSON for its type.
    #[error("Failed to parse model artifact {}: {source}", .path.display())]
    Json {
        /// Artifact path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// An artifact parsed but is internally inconsistent.
    #[error("Invalid model artifact: {message}")]
    InvalidArtifact {
        /// Description of what went wrong.
        message: String,
    },

    /// A categorical column holds a level the transform was not fitted on.
    #[error("Found unknown category '{value}' in column '{column}' during transform")]
    UnknownCategory {
        /// Column being encoded.
        column: FeatureColumn,
        /// The unseen level.
        value: String,
    },

    /// A numeric column holds a value that doesn't parse as a number.
    #[error("Could not convert '{value}' in column '{column}' to a number")]
    InvalidNumber {
        /// Column being scaled.
        column: FeatureColumn,
        /// The offending value.
        value: String,
    },

    /// The classifier produced no values.
    #[error("Model returned an empty prediction")]
    EmptyPrediction,

    /// The classifier produced NaN or infinity.
    #[error("Model returned a non-finite value: {value}")]
    NonFinite {
        /// The offending value.
        value: f64,
    },

    /// The arrest output is neither 0 nor 1.
    #[error("Arrest prediction must be 0 or 1, got {value}")]
    InvalidArrest {
        /// The offending value.
        value: i64,
    },
}

/// Output of the classifier before interpretation.
///
/// Model export conventions vary: most return one row per input with one
/// column per output, some return a flat vector. Both are valid.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPrediction {
    /// Two-dimensional output, rows by outputs.
    Matrix(Vec<Vec<f64>>),
    /// One-dimensional output.
    Flat(Vec<f64>),
}

/// An interpreted prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPrediction {
    /// `1` if an arrest is predicted, `0` otherwise.
    pub arrest: u8,
    /// Predicted category id. May be outside the known category table.
    pub category_id: i64,
}

impl RawPrediction {
    /// Extracts the arrest flag and category id.
    ///
    /// A matrix with at least two columns reads `[0][0]` as the arrest flag
    /// and `[0][1]` as the category. Anything else is read as a sequence:
    /// element 0 is the arrest flag and element 1, when present, the
    /// category, else [`FALLBACK_CATEGORY_ID`]. Values are truncated toward
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the prediction is empty, holds a
    /// non-finite value, or the arrest flag is not 0 or 1.
    pub fn interpret(&self) -> Result<ModelPrediction, ModelError> {
        let (arrest, category) = match self {
            Self::Matrix(rows) => match rows.first() {
                Some(first) if first.len() >= 2 => (first[0], Some(first[1])),
                Some(first) => (
                    *first.first().ok_or(ModelError::EmptyPrediction)?,
                    rows.get(1).and_then(|row| row.first().copied()),
                ),
                None => return Err(ModelError::EmptyPrediction),
            },
            Self::Flat(values) => (
                *values.first().ok_or(ModelError::EmptyPrediction)?,
                values.get(1).copied(),
            ),
        };

        let arrest = match to_integer(arrest)? {
            0 => 0,
            1 => 1,
            value => return Err(ModelError::InvalidArrest { value }),
        };
        let category_id = category.map_or(Ok(FALLBACK_CATEGORY_ID), to_integer)?;

        Ok(ModelPrediction {
            arrest,
            category_id,
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_integer(value: f64) -> Result<i64, ModelError> {
    if value.is_finite() {
        Ok(value.trunc() as i64)
    } else {
        Err(ModelError::NonFinite { value })
    }
}

/// A fitted classifier mapping one input record to its predictions.
///
/// Implementations must be deterministic and safe to share across
/// request handlers.
pub trait CrimeClassifier: Send + Sync {
    /// Runs the feature transform and the classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if the input cannot be transformed or the
    /// classifier fails.
    fn predict_raw(&self, input: &PredictionInput) -> Result<RawPrediction, ModelError>;

    /// Runs [`Self::predict_raw`] and interprets the result.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if prediction or interpretation fails.
    fn predict(&self, input: &PredictionInput) -> Result<ModelPrediction, ModelError> {
        self.predict_raw(input)?.interpret()
    }

    /// Label the training-time encoder assigned to a category id, if known.
    fn category_label(&self, _category_id: i64) -> Option<&str> {
        None
    }
}

/// Locations of the three model artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Feature transform.
    pub preprocessor: PathBuf,
    /// Multi-output classifier.
    pub classifier: PathBuf,
    /// Category label encoder.
    pub encoder: PathBuf,
}

impl ArtifactPaths {
    /// Resolves the three artifact file names against a model directory.
    #[must_use]
    pub fn in_dir(dir: &Path, preprocessor: &str, classifier: &str, encoder: &str) -> Self {
        Self {
            preprocessor: dir.join(preprocessor),
            classifier: dir.join(classifier),
            encoder: dir.join(encoder),
        }
    }
}

/// The production classifier, backed by the exported artifacts.
#[derive(Debug)]
pub struct ArtifactClassifier {
    preprocessor: Preprocessor,
    forest: MultiOutputForest,
    encoder: LabelEncoder,
}

impl ArtifactClassifier {
    /// Loads and cross-validates all three artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if any artifact is missing, malformed, or
    /// inconsistent with the others.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ModelError> {
        let preprocessor: Preprocessor = read_artifact(&paths.preprocessor)?;
        log::info!(
            "Loaded feature transform ({} columns -> {} features)",
            preprocessor.columns().len(),
            preprocessor.output_width()
        );

        let forest: MultiOutputForest = read_artifact(&paths.classifier)?;
        log::info!(
            "Loaded classifier ({} outputs, {} trees)",
            forest.outputs().len(),
            forest.tree_count()
        );

        let encoder: LabelEncoder = read_artifact(&paths.encoder)?;
        log::info!("Loaded category encoder ({} labels)", encoder.len());

        Self::new(preprocessor, forest, encoder)
    }

    /// Assembles a classifier from already-parsed artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidArtifact`] if the artifacts don't fit
    /// together.
    pub fn new(
        preprocessor: Preprocessor,
        forest: MultiOutputForest,
        encoder: LabelEncoder,
    ) -> Result<Self, ModelError> {
        preprocessor.validate()?;
        forest.validate(preprocessor.output_width())?;
        encoder.validate()?;

        if let Some(categories) = forest.outputs().get(1) {
            for class in categories.classes() {
                #[allow(clippy::cast_possible_truncation)]
                let id = class.trunc() as i64;
                if encoder.decode(id).is_none() {
                    log::warn!("Classifier category {id} has no encoder label");
                }
            }
        }

        Ok(Self {
            preprocessor,
            forest,
            encoder,
        })
    }
}

impl CrimeClassifier for ArtifactClassifier {
    fn predict_raw(&self, input: &PredictionInput) -> Result<RawPrediction, ModelError> {
        let features = self.preprocessor.transform(input)?;
        self.forest.predict(&features)
    }

    fn category_label(&self, category_id: i64) -> Option<&str> {
        self.encoder.decode(category_id)
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ModelError::Json {
        path: path.to_path_buf(),
        source,
    })
}
