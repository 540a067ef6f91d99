//! Bulk loading of the cleaned historical dataset.
//!
//! The CSV headers must match the table's column names (`ID`,
//! `Case Number`, `Primary Type`, ...). Historical rows keep their own case
//! numbers; only rows appended by the service use the `JK` format.

use std::io::Read;
use std::path::Path;

use crimescope_database_models::PredictionRecord;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Parses dataset rows from CSV.
///
/// # Errors
///
/// Returns [`DbError::Csv`] on the first malformed row.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PredictionRecord>, DbError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for result in csv.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Parses dataset rows from a CSV file.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be opened or parsed.
pub fn read_records_file(path: &Path) -> Result<Vec<PredictionRecord>, DbError> {
    let file = std::fs::File::open(path)?;
    read_records(file)
}

/// Inserts dataset rows in one transaction. With `replace`, existing rows
/// are deleted first, inside the same transaction.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails. Nothing is committed in that
/// case.
pub async fn insert_loaded_records(
    db: &dyn Database,
    records: &[PredictionRecord],
    replace: bool,
) -> Result<u64, DbError> {
    let txn = db.begin_transaction().await?;

    match insert_all(txn.as_ref(), records, replace).await {
        Ok(count) => {
            txn.commit().await?;
            log::info!("Loaded {count} records into crime_table");
            Ok(count)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                log::warn!("Rollback after failed load also failed: {rollback}");
            }
            Err(e)
        }
    }
}

async fn insert_all(
    db: &dyn Database,
    records: &[PredictionRecord],
    replace: bool,
) -> Result<u64, DbError> {
    if replace {
        db.exec_raw("DELETE FROM crime_table").await?;
    }

    let mut count = 0;
    for record in records {
        db.exec_raw_params(
            r#"INSERT INTO crime_table (
                "ID", "Case Number", "Primary Type", "Description", "Location Description",
                "Arrest", "Domestic", "District", "Crime Category",
                "DayOfWeek", "HourofDay", "DayorNight"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
            &[
                DatabaseValue::Int64(record.id),
                DatabaseValue::String(record.case_number.clone()),
                DatabaseValue::String(record.primary_type.clone()),
                DatabaseValue::String(record.description.clone()),
                DatabaseValue::String(record.location_description.clone()),
                DatabaseValue::Int64(record.arrest),
                DatabaseValue::Int64(record.domestic),
                DatabaseValue::Int64(record.district),
                DatabaseValue::String(record.category_name.clone()),
                DatabaseValue::Int64(record.day_of_week),
                DatabaseValue::Int64(record.hour_of_day),
                DatabaseValue::String(record.day_or_night.clone()),
            ],
        )
        .await?;
        count += 1;
    }

    Ok(count)
}
