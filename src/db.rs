use std::{sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    account::repo::{LedgerRepository, MemoryRepository},
    config::StorageConfig,
};

const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS account (
        account_id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        document TEXT NOT NULL,
        password TEXT NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS account_asset (
        account_id UUID NOT NULL REFERENCES account (account_id),
        asset_id TEXT NOT NULL,
        quantity NUMERIC NOT NULL CHECK (quantity >= 0),
        PRIMARY KEY (account_id, asset_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        order_id UUID PRIMARY KEY,
        market_id TEXT NOT NULL,
        account_id UUID NOT NULL REFERENCES account (account_id),
        side TEXT NOT NULL,
        quantity NUMERIC NOT NULL,
        price NUMERIC NOT NULL,
        fill_quantity NUMERIC NOT NULL,
        fill_price NUMERIC NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS orders_account_idx ON orders (account_id, created_at)"#,
];

#[cfg(feature = "sqlite")]
const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS account (
        account_id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        document TEXT NOT NULL,
        password TEXT NOT NULL
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS account_asset (
        account_id TEXT NOT NULL REFERENCES account (account_id),
        asset_id TEXT NOT NULL,
        quantity TEXT NOT NULL,
        PRIMARY KEY (account_id, asset_id)
    )"#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        order_id TEXT PRIMARY KEY,
        market_id TEXT NOT NULL,
        account_id TEXT NOT NULL REFERENCES account (account_id),
        side TEXT NOT NULL,
        quantity TEXT NOT NULL,
        price TEXT NOT NULL,
        fill_quantity TEXT NOT NULL,
        fill_price TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS orders_account_idx ON orders (account_id, created_at)"#,
];

pub struct Database;

impl Database {
    /// Builds the repository selected by `storage` and makes sure its schema
    /// exists. The returned handle is owned by the caller.
    pub async fn connect(storage: &StorageConfig) -> Result<Arc<dyn LedgerRepository>, sqlx::Error> {
        match storage {
            StorageConfig::Memory => {
                tracing::info!("using in-memory storage");
                Ok(Arc::new(MemoryRepository::new()))
            }
            #[cfg(feature = "sqlite")]
            StorageConfig::Database {
                url,
                max_connections,
                ..
            } if url.starts_with("sqlite:") => {
                tracing::info!("using sqlite storage");
                let pool = Self::new_sqlite_pool(url, *max_connections).await?;
                Self::migrate_sqlite(&pool).await?;
                Ok(Arc::new(pool))
            }
            StorageConfig::Database {
                url,
                max_connections,
                min_connections,
            } => {
                tracing::info!("using postgres storage");
                let pool = Self::new_pg_pool(url, *max_connections, *min_connections).await?;
                Self::migrate_pg(&pool).await?;
                Ok(Arc::new(pool))
            }
        }
    }

    pub async fn new_pg_pool(
        url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .idle_timeout(Duration::from_secs(30))
            .connect(url)
            .await
    }

    pub async fn migrate_pg(pool: &PgPool) -> Result<(), sqlx::Error> {
        for statement in POSTGRES_SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    #[cfg(feature = "sqlite")]
    pub async fn new_sqlite_pool(
        url: &str,
        max_connections: u32,
    ) -> Result<sqlx::SqlitePool, sqlx::Error> {
        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    #[cfg(feature = "sqlite")]
    pub async fn migrate_sqlite(pool: &sqlx::SqlitePool) -> Result<(), sqlx::Error> {
        for statement in SQLITE_SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }
}
