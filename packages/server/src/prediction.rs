//! The prediction pipeline behind `POST /predict`.
//!
//! Normalize the body, run the classifier, resolve the category, then
//! persist. A record is only written once both the arrest flag and the
//! category are known, and a prediction that can't be persisted is not
//! reported. The records database is opened per request, after the model
//! has answered, and closed when the request ends.

use std::path::Path;

use crimescope_crime_models::resolve;
use crimescope_database::{DbError, append_record, open_db};
use crimescope_database_models::{NewPredictionRecord, PredictionRecord};
use crimescope_model::{CrimeClassifier, ModelError};
use crimescope_prediction_models::{NormalizeError, PredictionInput};
use crimescope_server_models::ApiPredictions;
use thiserror::Error;

/// Why a prediction request failed.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The request body couldn't be normalized.
    #[error(transparent)]
    Input(#[from] NormalizeError),

    /// The classifier rejected the input.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The prediction succeeded but the records database couldn't be
    /// opened or written.
    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl PredictError {
    /// Whether this failed after a successful model call.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// A completed, persisted prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionOutcome {
    /// Derived predictions.
    pub predictions: ApiPredictions,
    /// The record as stored.
    pub record: PredictionRecord,
}

/// Runs one prediction request end to end.
///
/// # Errors
///
/// Returns [`PredictError`] from whichever stage failed. Nothing is
/// persisted unless every stage before the append succeeded.
pub async fn predict(
    db_path: &Path,
    classifier: &dyn CrimeClassifier,
    body: &[u8],
) -> Result<PredictionOutcome, PredictError> {
    let input = PredictionInput::from_slice(body)?;
    log::debug!("Predicting for {input:?}");

    let prediction = classifier.predict(&input)?;
    let fields = input.integer_fields()?;
    let category = resolve(prediction.category_id);

    if category.is_fallback() {
        log::warn!(
            "Category {} is not in the category table, reporting '{}'",
            prediction.category_id,
            category.name
        );
    } else if let Some(label) = classifier.category_label(prediction.category_id) {
        if label != category.name {
            log::debug!(
                "Category {} is '{label}' in the encoder, reporting '{}'",
                prediction.category_id,
                category.name
            );
        }
    }

    let arrest = i64::from(prediction.arrest);
    let db = open_db(db_path).await?;
    let record = append_record(
        db.as_ref(),
        NewPredictionRecord {
            primary_type: input.primary_type,
            description: input.description,
            location_description: input.location_description,
            arrest,
            domestic: fields.domestic,
            district: fields.district,
            category_name: category.name.to_string(),
            day_of_week: fields.day_of_week,
            hour_of_day: fields.hour_of_day,
            day_or_night: input.day_or_night,
        },
    )
    .await?;

    Ok(PredictionOutcome {
        predictions: ApiPredictions::new(arrest, &category),
        record,
    })
}
