#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI for inspecting and loading the prediction records database.
//!
//! ```text
//! crimescope_records [--db crime_data.db] check
//! crimescope_records [--db crime_data.db] list [--limit 20]
//! crimescope_records [--db crime_data.db] load cleaned_data.csv [--replace]
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crimescope_database::{
    DEFAULT_DB_PATH, TABLE_NAME, connect, count_records, list_tables,
    load::{insert_loaded_records, read_records_file},
    open_db,
    queries::list_recent_records,
};

#[derive(Parser)]
#[command(
    name = "crimescope_records",
    about = "Inspect and load the CrimeScope records database"
)]
struct Cli {
    /// Path to the `SQLite` database
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and the record count
    Check,
    /// Show the most recent records
    List {
        /// Maximum number of records to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Load a cleaned dataset CSV into the record table
    Load {
        /// CSV file whose headers match the table columns
        csv: PathBuf,
        /// Delete existing rows before loading
        #[arg(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            let db = connect(&cli.db)?;
            let tables = list_tables(db.as_ref()).await?;
            println!("Tables in {}: {tables:?}", cli.db.display());

            if tables.iter().any(|t| t == TABLE_NAME) {
                let count = count_records(db.as_ref()).await?;
                println!("Rows in {TABLE_NAME}: {count}");
            } else {
                println!("{TABLE_NAME} does not exist!");
            }
        }
        Commands::List { limit } => {
            let db = open_db(&cli.db).await?;
            let records = list_recent_records(db.as_ref(), limit).await?;

            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            println!(
                "{:<8} {:<12} {:<24} {:<7} {:<5} {:<18} TIME",
                "ID", "CASE", "TYPE", "ARREST", "DIST", "CATEGORY"
            );
            println!("{}", "-".repeat(90));

            for r in &records {
                println!(
                    "{:<8} {:<12} {:<24} {:<7} {:<5} {:<18} {:02}:00 {}",
                    r.id,
                    r.case_number,
                    truncate(&r.primary_type, 24),
                    if r.arrest == 1 { "yes" } else { "no" },
                    r.district,
                    truncate(&r.category_name, 18),
                    r.hour_of_day,
                    r.day_or_night,
                );
            }

            let total = count_records(db.as_ref()).await?;
            println!("\n{} of {total} record(s)", records.len());
        }
        Commands::Load { csv, replace } => {
            let records = read_records_file(&csv)?;
            let db = open_db(&cli.db).await?;
            let count = insert_loaded_records(db.as_ref(), &records, replace).await?;
            println!("Loaded {count} record(s) into {TABLE_NAME}");
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
