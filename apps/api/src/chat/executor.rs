//! Runs model-generated SQL and materialises the rows as JSON objects.
//!
//! The statement is executed verbatim. The database role is expected to be
//! read-only; nothing here restricts what the statement does.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use tracing::{info, warn};

/// One result row, keyed by column name in SELECT order.
pub type ResultRow = Map<String, Value>;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<ResultRow>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<ResultRow>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        let rows: Vec<ResultRow> = rows.iter().map(row_to_map).collect();
        info!("Query executed successfully ({} rows)", rows.len());
        Ok(rows)
    }
}

fn row_to_map(row: &PgRow) -> ResultRow {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_column(row, column)))
        .collect()
}

/// Decodes one cell by its Postgres type name. Unknown types are read as text
/// when possible and become `null` otherwise.
fn decode_column(row: &PgRow, column: &PgColumn) -> Value {
    let idx = column.ordinal();
    let type_name = column.type_info().name();

    let decoded = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(to_json),
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(to_json),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(to_json),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(to_json),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(to_json),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(to_json),
        "NUMERIC" => row
            .try_get::<Option<Decimal>, _>(idx)
            .map(|v| v.map(decimal_to_json).unwrap_or(Value::Null)),
        "DATE" => row.try_get::<Option<chrono::NaiveDate>, _>(idx).map(to_json),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(to_json),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .map(to_json),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .map(|v| v.unwrap_or(Value::Null)),
        _ => row.try_get::<Option<String>, _>(idx).map(to_json),
    };

    decoded.unwrap_or_else(|e| {
        warn!(
            "Could not decode column '{}' of type {type_name}: {e}",
            column.name()
        );
        Value::Null
    })
}

fn to_json<T: serde::Serialize>(value: Option<T>) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Numbers that fit an `f64` stay numeric; anything else keeps its exact text.
fn decimal_to_json(value: Decimal) -> Value {
    value
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_decimal_becomes_json_number() {
        let value = decimal_to_json(Decimal::from_str("1234.50").unwrap());
        assert_eq!(value, serde_json::json!(1234.5));
    }

    #[test]
    fn test_to_json_handles_null_and_dates() {
        assert_eq!(to_json::<i32>(None), Value::Null);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(to_json(date), serde_json::json!("2024-01-31"));
    }
}
