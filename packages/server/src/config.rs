//! Server configuration from environment variables.

use std::path::PathBuf;

use crimescope_model::ArtifactPaths;

/// External analytics dashboard linked from the page.
pub const DEFAULT_DASHBOARD_URL: &str = "https://app.powerbi.com/view?r=eyJrIjoiODdiNzkxMjktN2FhMy00OGZkLWI0ZTUtOTI3MmFiMTk2NWNlIiwidCI6IjkwMWQ5YTk5LTI3NTgtNGM5ZS1iNWM3LTI2MWM2OTIwZmQzNyIsImMiOjl9";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Everything the server reads from its environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Records database (`CRIME_DB_PATH`).
    pub db_path: PathBuf,
    /// Directory holding the model artifacts (`MODEL_DIR`).
    pub model_dir: PathBuf,
    /// Feature transform file name (`PREPROCESSOR_FILE`).
    pub preprocessor_file: String,
    /// Classifier file name (`CLASSIFIER_FILE`).
    pub classifier_file: String,
    /// Category encoder file name (`ENCODER_FILE`).
    pub encoder_file: String,
    /// External dashboard (`DASHBOARD_URL`).
    pub dashboard_url: String,
    /// Front-end directory served at `/` (`STATIC_DIR`).
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset variables, and a
    /// `PORT` that isn't a valid port number, fall back to the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            bind_addr: var("BIND_ADDR", DEFAULT_BIND_ADDR),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            db_path: var("CRIME_DB_PATH", crimescope_database::DEFAULT_DB_PATH).into(),
            model_dir: var("MODEL_DIR", "models").into(),
            preprocessor_file: var("PREPROCESSOR_FILE", "preprocessor.json"),
            classifier_file: var("CLASSIFIER_FILE", "classifier.json"),
            encoder_file: var("ENCODER_FILE", "crime_encoder.json"),
            dashboard_url: var("DASHBOARD_URL", DEFAULT_DASHBOARD_URL),
            static_dir: var("STATIC_DIR", "static").into(),
        }
    }

    /// Full paths of the three model artifacts.
    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(
            &self.model_dir,
            &self.preprocessor_file,
            &self.classifier_file,
            &self.encoder_file,
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
