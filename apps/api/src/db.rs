use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables the service needs. Creation is idempotent and runs at startup.
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS chat_message (
        id          SERIAL PRIMARY KEY,
        content     TEXT NOT NULL,
        timestamp   TIMESTAMPTZ NOT NULL DEFAULT now(),
        is_user     BOOLEAN NOT NULL DEFAULT TRUE,
        query_info  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customer_data (
        id                    SERIAL PRIMARY KEY,
        customer_name         TEXT NOT NULL,
        year                  INTEGER NOT NULL,
        quarter               VARCHAR(2) NOT NULL,
        total_order_amount    DOUBLE PRECISION NOT NULL,
        average_order_amount  DOUBLE PRECISION NOT NULL,
        order_frequency       INTEGER NOT NULL,
        categorized           INTEGER NOT NULL
    )
    "#,
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the chat log and customer tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database tables created successfully");
    Ok(())
}
