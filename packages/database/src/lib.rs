#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Prediction record store backed by `SQLite`.
//!
//! Every completed prediction is appended as one row of `crime_table`, the
//! same table the historical dataset is loaded into. Rows are never updated
//! or deleted by the service.
//!
//! Uses `switchy_database` for all database operations. Queries are raw SQL
//! because the column names contain spaces and must be quoted.

pub mod load;
pub mod queries;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

pub use queries::{append_record, count_records, list_records, list_tables, table_exists};

/// Default path for the records database.
pub const DEFAULT_DB_PATH: &str = "crime_data.db";

/// Name of the record table.
pub const TABLE_NAME: &str = "crime_table";

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset file could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens the `SQLite` database at `path` without touching the schema.
///
/// # Errors
///
/// Returns [`DbError::Connection`] if the file cannot be opened.
pub fn connect(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))
}

/// Opens (or creates) the records database and ensures `crime_table`
/// exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema creation
/// fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    let db = connect(path)?;
    ensure_schema(db.as_ref()).await?;
    log::debug!("Opened records database at {}", path.display());
    Ok(db)
}

/// Creates the record table if it doesn't already exist. A table created by
/// an earlier dataset load is left as is.
///
/// # Errors
///
/// Returns [`DbError`] if the statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        r#"CREATE TABLE IF NOT EXISTS crime_table (
            "ID"                   INTEGER,
            "Case Number"          TEXT,
            "Primary Type"         TEXT,
            "Description"          TEXT,
            "Location Description" TEXT,
            "Arrest"               INTEGER,
            "Domestic"             INTEGER,
            "District"             INTEGER,
            "Crime Category"       TEXT,
            "DayOfWeek"            INTEGER,
            "HourofDay"            INTEGER,
            "DayorNight"           TEXT
        )"#,
    )
    .await?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::TempDb;

    #[tokio::test]
    async fn open_db_creates_the_table() {
        let temp = TempDb::new().await;
        assert!(table_exists(temp.db.as_ref(), TABLE_NAME).await.unwrap());
        assert_eq!(count_records(temp.db.as_ref()).await.unwrap(), 0);

        // Idempotent against an existing table.
        ensure_schema(temp.db.as_ref()).await.unwrap();
    }

    #[tokio::test]
    async fn connect_leaves_the_schema_alone() {
        let path = std::env::temp_dir().join(format!(
            "crimescope-records-{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = connect(&path).unwrap();
        assert!(!table_exists(db.as_ref(), TABLE_NAME).await.unwrap());
        drop(db);
        let _ = std::fs::remove_file(&path);
    }
}
