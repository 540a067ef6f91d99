//! Record store queries.

use crimescope_database_models::{NewPredictionRecord, PredictionRecord};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use tokio::sync::Mutex;

use crate::DbError;

/// Serializes appends from this process. Cross-process writers are still
/// kept consistent by the single-statement insert.
static APPEND_LOCK: Mutex<()> = Mutex::const_new(());

const APPEND_SQL: &str = r#"INSERT INTO crime_table (
        "ID", "Case Number", "Primary Type", "Description", "Location Description",
        "Arrest", "Domestic", "District", "Crime Category",
        "DayOfWeek", "HourofDay", "DayorNight"
    )
    SELECT next_id, printf('JK%06d', next_id), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
    FROM (SELECT COALESCE(MAX("ID"), 0) + 1 AS next_id FROM crime_table)
    RETURNING "ID", "Case Number""#;

/// Appends a prediction record and returns it with its assigned id and case
/// number.
///
/// The next id and the case number come from a single read of the current
/// maximum inside the insert statement itself, and the statement runs in its
/// own transaction. This is the only write path for predictions.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails. Nothing is committed in that
/// case.
pub async fn append_record(
    db: &dyn Database,
    record: NewPredictionRecord,
) -> Result<PredictionRecord, DbError> {
    let _guard = APPEND_LOCK.lock().await;

    let txn = db.begin_transaction().await?;

    let params = [
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
    ];

    let rows = match txn.query_raw_params(APPEND_SQL, &params).await {
        Ok(rows) => rows,
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                log::warn!("Rollback after failed append also failed: {rollback}");
            }
            return Err(e.into());
        }
    };

    let Some(row) = rows.first() else {
        txn.rollback().await?;
        return Err(DbError::Conversion {
            message: "insert returned no row".to_string(),
        });
    };

    let assigned = row
        .to_value("ID")
        .map_err(|e| format!("assigned ID: {e:?}"))
        .and_then(|id: i64| {
            row.to_value("Case Number")
                .map(|case_number: String| (id, case_number))
                .map_err(|e| format!("assigned Case Number: {e:?}"))
        });

    let (id, case_number) = match assigned {
        Ok(assigned) => assigned,
        Err(message) => {
            txn.rollback().await?;
            return Err(DbError::Conversion { message });
        }
    };

    txn.commit().await?;

    log::debug!("Appended record {id} ({case_number})");

    Ok(PredictionRecord::from_new(id, case_number, record))
}

/// Returns every row of the record table, in whatever order the database
/// yields them.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_records(db: &dyn Database) -> Result<Vec<PredictionRecord>, DbError> {
    let rows = db.query_raw_params("SELECT * FROM crime_table", &[]).await?;
    Ok(rows.iter().map(record_from_row).collect())
}

/// Returns the `limit` rows with the highest ids, in ascending id order.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_recent_records(
    db: &dyn Database,
    limit: u32,
) -> Result<Vec<PredictionRecord>, DbError> {
    let rows = db
        .query_raw_params(
            r#"SELECT * FROM crime_table ORDER BY "ID" DESC LIMIT $1"#,
            &[DatabaseValue::Int64(i64::from(limit))],
        )
        .await?;

    let mut records: Vec<_> = rows.iter().map(record_from_row).collect();
    records.reverse();
    Ok(records)
}

/// Number of rows in the record table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn count_records(db: &dyn Database) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) AS count FROM crime_table", &[])
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "COUNT returned no row".to_string(),
    })?;

    row.to_value("count").map_err(|e| DbError::Conversion {
        message: format!("record count: {e:?}"),
    })
}

/// Names of all tables in the database, sorted.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_tables(db: &dyn Database) -> Result<Vec<String>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            &[],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| row.to_value("name").unwrap_or_default())
        .collect())
}

/// Whether a table named `name` exists.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn table_exists(db: &dyn Database, name: &str) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1",
            &[DatabaseValue::String(name.to_string())],
        )
        .await?;

    Ok(!rows.is_empty())
}

fn record_from_row(row: &switchy_database::Row) -> PredictionRecord {
    PredictionRecord {
        id: row.to_value("ID").unwrap_or(0),
        case_number: row.to_value("Case Number").unwrap_or_default(),
        primary_type: row.to_value("Primary Type").unwrap_or_default(),
        description: row.to_value("Description").unwrap_or_default(),
        location_description: row.to_value("Location Description").unwrap_or_default(),
        arrest: row.to_value("Arrest").unwrap_or(0),
        domestic: row.to_value("Domestic").unwrap_or(0),
        district: row.to_value("District").unwrap_or(0),
        category_name: row.to_value("Crime Category").unwrap_or_default(),
        day_of_week: row.to_value("DayOfWeek").unwrap_or(0),
        hour_of_day: row.to_value("HourofDay").unwrap_or(0),
        day_or_night: row.to_value("DayorNight").unwrap_or_default(),
    }
}
