#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the CrimeScope prediction service.
//!
//! Serves the prediction form from `STATIC_DIR`, runs predictions through
//! the pre-fitted classifier on `POST /predict`, and records every
//! prediction in the `SQLite` records database. The model artifacts are
//! loaded once at startup and shared by all workers. The records database is
//! opened by each request that needs it, so a missing or unwritable database
//! fails those requests without stopping the server.

pub mod config;
mod handlers;
pub mod prediction;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use crimescope_model::{ArtifactClassifier, CrimeClassifier};

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Records database file, opened per request.
    pub db_path: PathBuf,
    /// Loaded classifier.
    pub classifier: Arc<dyn CrimeClassifier>,
    /// External dashboard URL.
    pub dashboard_url: String,
}

/// Registers the API routes. Static files are mounted separately by
/// [`run_server`] because they must come last.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/predict", web::post().to(handlers::predict))
        .route("/getData", web::get().to(handlers::get_data))
        .route("/health", web::get().to(handlers::health))
        .route("/check-dashboard", web::get().to(handlers::check_dashboard))
        .route("/open-dashboard", web::get().to(handlers::open_dashboard));
}

/// Starts the CrimeScope server.
///
/// Loads the model artifacts and starts the Actix-Web HTTP server. The
/// records database is not touched here. This is a regular async function: the caller
/// provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an error if any model artifact fails to load or the HTTP server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Loading model artifacts from {}...", config.model_dir.display());
    let classifier = ArtifactClassifier::load(&config.artifact_paths()).map_err(|e| {
        log::error!("Failed to load model artifacts: {e}");
        std::io::Error::other(e)
    })?;

    log::info!("Recording predictions in {}", config.db_path.display());

    let state = web::Data::new(AppState {
        db_path: config.db_path.clone(),
        classifier: Arc::new(classifier),
        dashboard_url: config.dashboard_url.clone(),
    });

    let static_dir = config.static_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve the front-end
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use crimescope_database::{count_records, open_db};
    use crimescope_model::{ModelError, RawPrediction};
    use crimescope_prediction_models::PredictionInput;
    use serde_json::{Value, json};

    use super::*;

    const DASHBOARD: &str = "https://dashboard.example/report";

    /// Deterministic stand-in for the fitted model.
    enum StubClassifier {
        /// BATTERY predicts an arrest and a violent crime, everything else
        /// no arrest and a property crime.
        ByType,
        /// Always returns this output.
        Fixed(RawPrediction),
        /// Always fails.
        Failing,
    }

    impl CrimeClassifier for StubClassifier {
        fn predict_raw(&self, input: &PredictionInput) -> Result<RawPrediction, ModelError> {
            match self {
                Self::ByType if input.primary_type == "BATTERY" => {
                    Ok(RawPrediction::Matrix(vec![vec![1.0, 4.0]]))
                }
                Self::ByType => Ok(RawPrediction::Matrix(vec![vec![0.0, 2.0]])),
                Self::Fixed(output) => Ok(output.clone()),
                Self::Failing => Err(ModelError::EmptyPrediction),
            }
        }
    }

    struct TempPath(PathBuf);

    impl TempPath {
        fn new() -> Self {
            Self(std::env::temp_dir().join(format!(
                "crimescope-server-{}.db",
                uuid::Uuid::new_v4()
            )))
        }
    }

    impl Drop for TempPath {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn state_with(path: &Path, classifier: StubClassifier) -> web::Data<AppState> {
        web::Data::new(AppState {
            db_path: path.to_path_buf(),
            classifier: Arc::new(classifier),
            dashboard_url: DASHBOARD.to_string(),
        })
    }

    async fn stored(path: &TempPath) -> i64 {
        let db = open_db(&path.0).await.unwrap();
        count_records(db.as_ref()).await.unwrap()
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_needs_neither_model_nor_store() {
        let file = TempPath::new();
        std::fs::write(&file.0, b"").unwrap();
        let state = state_with(&file.0.join("records.db"), StubClassifier::Failing);
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model"], "CrimeScope AI v2.0");
        assert_eq!(body["accuracy"], "91.6%");
        assert_eq!(body["features"], 8);
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[actix_web::test]
    async fn empty_request_uses_defaults() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["model"], "CrimeScope AI v2.0");
        assert_eq!(body["confidence"], "91.6%");
        assert!(body["processing_time"].as_str().unwrap().ends_with('s'));
        assert_eq!(
            body["predictions"],
            json!({
                "arrest": 0,
                "category": "Property Crime",
                "category_numeric": 2,
                "risk_level": "Medium",
            })
        );

        let record = &body["form_response"];
        assert_eq!(record["ID"], 1);
        assert_eq!(record["Case Number"], "JK000001");
        assert_eq!(record["Primary Type"], "THEFT");
        assert_eq!(record["Description"], "OVER $500");
        assert_eq!(record["Location Description"], "STREET");
        assert_eq!(record["Domestic"], 0);
        assert_eq!(record["District"], 12);
        assert_eq!(record["DayOfWeek"], 0);
        assert_eq!(record["HourofDay"], 14);
        assert_eq!(record["DayorNight"], "DAY");
        assert_eq!(record["Crime Category"], "Property Crime");
    }

    #[actix_web::test]
    async fn predicts_and_records_submitted_fields() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/predict")
                .set_json(json!({}))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({
                "Primary Type": "BATTERY",
                "Description": "DOMESTIC BATTERY SIMPLE",
                "Location Description": "RESIDENCE",
                "Domestic": true,
                "District": 25,
                "DayOfWeek": 6,
                "HourofDay": "23",
                "DayorNight": "NIGHT",
                "Ignored": "extra",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["predictions"]["arrest"], 1);
        assert_eq!(body["predictions"]["category"], "Violent Crime");
        assert_eq!(body["predictions"]["risk_level"], "Critical");
        assert_eq!(body["form_response"]["Case Number"], "JK000003");
        assert_eq!(body["form_response"]["Arrest"], 1);
        assert_eq!(body["form_response"]["Domestic"], 1);
        assert_eq!(body["form_response"]["District"], 25);
        assert_eq!(body["form_response"]["HourofDay"], 23);

        let req = test::TestRequest::get().uri("/getData").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCrime"], 3);
        assert_eq!(body["crimeRecords"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn unknown_category_gets_fallback_name() {
        let path = TempPath::new();
        let state = state_with(
            &path,
            StubClassifier::Fixed(RawPrediction::Matrix(vec![vec![0.0, 7.0]])),
        )
        ;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["predictions"]["category"], "Category 7");
        assert_eq!(body["predictions"]["category_numeric"], 7);
        assert_eq!(body["predictions"]["risk_level"], "Medium");
        assert_eq!(body["form_response"]["Crime Category"], "Category 7");
    }

    #[actix_web::test]
    async fn flat_output_without_category_uses_fallback_id() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::Fixed(RawPrediction::Flat(vec![1.0])));
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["predictions"]["arrest"], 1);
        assert_eq!(body["predictions"]["category"], "Other Crime");
        assert_eq!(body["predictions"]["risk_level"], "Low");
    }

    #[actix_web::test]
    async fn invalid_requests_fail_without_persisting() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        let bodies = [
            test::TestRequest::post()
                .uri("/predict")
                .insert_header(header::ContentType::json())
                .set_payload("{not json"),
            test::TestRequest::post()
                .uri("/predict")
                .set_json(json!(["THEFT"])),
            test::TestRequest::post()
                .uri("/predict")
                .set_json(json!({ "District": "north" })),
        ];

        for req in bodies {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
            assert!(!body["error"].as_str().unwrap().is_empty());
            assert_eq!(body["suggestion"], "Ensure all inputs are valid and try again.");
        }

        assert_eq!(stored(&path).await, 0);
    }

    #[actix_web::test]
    async fn model_failure_is_a_bad_request() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::Failing);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stored(&path).await, 0);
    }

    #[actix_web::test]
    async fn store_failure_discards_the_prediction() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        test::call_service(&app, req).await;

        open_db(&path.0)
            .await
            .unwrap()
            .exec_raw(
                "CREATE TRIGGER reject_inserts BEFORE INSERT ON crime_table
                 BEGIN SELECT RAISE(ABORT, 'simulated write failure'); END",
            )
            .await
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body.get("predictions").is_none());
        assert_eq!(stored(&path).await, 1);
    }

    #[actix_web::test]
    async fn unopenable_store_fails_each_request() {
        let file = TempPath::new();
        std::fs::write(&file.0, b"").unwrap();
        let state = state_with(&file.0.join("records.db"), StubClassifier::ByType);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(body.get("predictions").is_none());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/getData").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(body.get("suggestion").is_none());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn get_data_on_a_fresh_store_is_empty() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/getData").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCrime"], 0);
    }

    #[actix_web::test]
    async fn dashboard_routes() {
        let path = TempPath::new();
        let state = state_with(&path.0, StubClassifier::ByType);
        let app = app!(state);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/open-dashboard").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), DASHBOARD);

        let req = test::TestRequest::get().uri("/check-dashboard").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["running"], true);
        assert_eq!(body["url"], DASHBOARD);
    }
}
