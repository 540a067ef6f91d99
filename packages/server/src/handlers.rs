//! HTTP handler functions for the CrimeScope API.

use std::time::Instant;

use actix_web::{HttpResponse, http::header, web};
use crimescope_database::{DbError, list_records, open_db};
use crimescope_database_models::PredictionRecord;
use crimescope_model::{MODEL_ACCURACY, MODEL_NAME};
use crimescope_server_models::{
    ApiDashboardStatus, ApiErrorResponse, ApiHealth, ApiPredictResponse, ApiRecordsResponse,
};

use crate::AppState;
use crate::prediction::{self, PredictionOutcome};

/// `POST /predict`
///
/// Runs the classifier on the submitted fields and records the result.
pub async fn predict(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let started = Instant::now();

    match prediction::predict(&state.db_path, state.classifier.as_ref(), &body).await {
        Ok(PredictionOutcome {
            predictions,
            record,
        }) => {
            log::info!(
                "Prediction {}: {} (arrest={})",
                record.case_number,
                predictions.category,
                predictions.arrest
            );
            HttpResponse::Ok().json(ApiPredictResponse {
                success: true,
                model: MODEL_NAME.to_string(),
                confidence: MODEL_ACCURACY.to_string(),
                processing_time: format!("{:.3}s", started.elapsed().as_secs_f64()),
                predictions,
                form_response: record,
            })
        }
        Err(e) => {
            if e.is_persistence() {
                log::error!("Failed to record prediction: {e}");
            } else {
                log::error!("Prediction failed: {e}");
            }
            HttpResponse::BadRequest().json(ApiErrorResponse::prediction(e.to_string()))
        }
    }
}

/// `GET /getData`
///
/// Lists every stored record.
pub async fn get_data(state: web::Data<AppState>) -> HttpResponse {
    match load_records(&state).await {
        Ok(records) => HttpResponse::Ok().json(ApiRecordsResponse::new(records)),
        Err(e) => {
            log::error!("Failed to list records: {e}");
            HttpResponse::BadRequest().json(ApiErrorResponse::new(e.to_string()))
        }
    }
}

async fn load_records(state: &AppState) -> Result<Vec<PredictionRecord>, DbError> {
    let db = open_db(&state.db_path).await?;
    list_records(db.as_ref()).await
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth::healthy(
        chrono::Utc::now(),
        MODEL_NAME,
        MODEL_ACCURACY,
    ))
}

/// `GET /check-dashboard`
pub async fn check_dashboard(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiDashboardStatus {
        running: true,
        url: state.dashboard_url.clone(),
        message: "Power BI dashboard is available online".to_string(),
    })
}

/// `GET /open-dashboard`
pub async fn open_dashboard(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, state.dashboard_url.as_str()))
        .finish()
}
