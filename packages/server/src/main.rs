#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CrimeScope prediction server.
//!
//! Configuration is read from the environment (`PORT`, `CRIME_DB_PATH`,
//! `MODEL_DIR`, ...); see [`crimescope_server::ServerConfig`].

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    crimescope_server::run_server().await
}
