//! Bulk loader for the `customer_data` table.
//!
//! Reads the clustered-customers CSV produced by the offline segmentation and
//! replaces the table contents in a single transaction.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::info;

use crate::models::customer::CustomerRecord;

/// Rows per INSERT statement; seven binds each keeps well under the parameter limit.
const BATCH_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Normalises a CSV header: trimmed, lowercase, spaces to underscores, dots and quotes removed.
pub fn clean_column_name(column: &str) -> String {
    column
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace(['.', '"'], "")
}

/// Parses customer rows, matching columns by their normalised header names.
/// Columns the table does not know are ignored.
pub fn read_customer_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers: StringRecord = rdr.headers()?.iter().map(clean_column_name).collect();
    rdr.set_headers(headers);
    rdr.deserialize().collect()
}

/// Replaces every row of `customer_data` with `records`.
pub async fn replace_customer_data(
    pool: &PgPool,
    records: &[CustomerRecord],
) -> Result<u64, IngestError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM customer_data")
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0;
    for chunk in records.chunks(BATCH_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO customer_data \
             (customer_name, year, quarter, total_order_amount, average_order_amount, order_frequency, categorized) ",
        );
        builder.push_values(chunk, |mut row, record| {
            row.push_bind(record.customer_name.clone())
                .push_bind(record.year)
                .push_bind(record.quarter.clone())
                .push_bind(record.total_order_amount)
                .push_bind(record.average_order_amount)
                .push_bind(record.order_frequency)
                .push_bind(record.categorized);
        });
        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Reads `csv_path` and loads it into `customer_data`.
pub async fn load_customers(pool: &PgPool, csv_path: &Path) -> Result<u64, IngestError> {
    let path = csv_path.display().to_string();
    let records = File::open(csv_path)
        .map_err(csv::Error::from)
        .and_then(read_customer_records)
        .map_err(|source| IngestError::Csv {
            path: path.clone(),
            source,
        })?;
    info!("Parsed {} customer rows from {path}", records.len());

    let inserted = replace_customer_data(pool, &records).await?;
    info!("Successfully loaded {inserted} rows into customer_data table");
    Ok(inserted)
}
