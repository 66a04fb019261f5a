use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{
    Debit, LedgerRepository, map_insert_error, overflow, parse_asset, parse_side, parse_status,
};
use crate::{
    account::model::Account,
    asset::{AssetId, Holding},
    error::StorageError,
    order::{Order, OrderStatus},
};

type AccountRow = (String, String, String, String, String);
type OrderRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

fn parse_uuid(value: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(value).map_err(|_| StorageError::Corrupt(format!("id '{}'", value)))
}

fn parse_quantity(value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value).map_err(|_| StorageError::Corrupt(format!("quantity '{}'", value)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| StorageError::Corrupt(format!("timestamp '{}'", value)))
}

fn account_from_row(
    (account_id, name, email, document, password): AccountRow,
) -> Result<Account, StorageError> {
    Ok(Account {
        account_id: parse_uuid(&account_id)?,
        name,
        email,
        document,
        password,
    })
}

fn order_from_row(row: OrderRow) -> Result<Order, StorageError> {
    let (order_id, market_id, account_id, side, quantity, price, fill_quantity, fill_price, status, timestamp) =
        row;
    Ok(Order {
        order_id: parse_uuid(&order_id)?,
        market_id,
        account_id: parse_uuid(&account_id)?,
        side: parse_side(&side)?,
        quantity: parse_quantity(&quantity)?,
        price: parse_quantity(&price)?,
        fill_quantity: parse_quantity(&fill_quantity)?,
        fill_price: parse_quantity(&fill_price)?,
        status: parse_status(&status)?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

async fn read_quantity(
    conn: &mut SqliteConnection,
    account_id: Uuid,
    asset_id: AssetId,
) -> Result<Option<Decimal>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"SELECT quantity FROM account_asset WHERE account_id = ?1 AND asset_id = ?2"#,
    )
    .bind(account_id.to_string())
    .bind(asset_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    row.map(|(quantity,)| parse_quantity(&quantity)).transpose()
}

async fn write_quantity(
    conn: &mut SqliteConnection,
    account_id: Uuid,
    asset_id: AssetId,
    quantity: Decimal,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO account_asset (account_id, asset_id, quantity)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (account_id, asset_id) DO UPDATE SET quantity = excluded.quantity"#,
    )
    .bind(account_id.to_string())
    .bind(asset_id.as_str())
    .bind(quantity.to_string())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn add_quantity(
    conn: &mut SqliteConnection,
    account_id: Uuid,
    asset_id: AssetId,
    delta: Decimal,
) -> Result<(), StorageError> {
    let current = read_quantity(conn, account_id, asset_id)
        .await?
        .unwrap_or(Decimal::ZERO);
    let next = current
        .checked_add(delta)
        .ok_or_else(|| overflow(account_id, asset_id))?;
    write_quantity(conn, account_id, asset_id, next).await
}

async fn take_quantity(
    conn: &mut SqliteConnection,
    account_id: Uuid,
    asset_id: AssetId,
    delta: Decimal,
) -> Result<Debit, StorageError> {
    let Some(available) = read_quantity(conn, account_id, asset_id).await? else {
        return Ok(Debit::Missing);
    };
    if available < delta {
        return Ok(Debit::Insufficient);
    }
    write_quantity(conn, account_id, asset_id, available - delta).await?;
    Ok(Debit::Applied)
}

/// Opens a write transaction. `IMMEDIATE` takes the database write lock
/// before the balance is read, so a second writer waits on the busy timeout
/// instead of reading a value that is about to change.
async fn begin_immediate(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

/// Commits on success and rolls back otherwise, so the connection goes back
/// to the pool outside any transaction.
async fn finish<T>(
    conn: &mut SqliteConnection,
    result: Result<T, StorageError>,
) -> Result<T, StorageError> {
    let result = match result {
        Ok(value) => sqlx::query("COMMIT")
            .execute(&mut *conn)
            .await
            .map(|_| value)
            .map_err(StorageError::from),
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            tracing::warn!(error = ?e, "sqlite rollback failed");
        }
    }
    result
}

// SQLite has no native decimal type, so balance arithmetic happens here, with
// each read-modify-write inside its own write transaction.
#[async_trait]
impl LedgerRepository for SqlitePool {
    async fn create_account(&self, account: &Account) -> Result<Uuid, StorageError> {
        sqlx::query(
            r#"
            INSERT INTO account (account_id, name, email, document, password)
            VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(account.account_id.to_string())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.document)
        .bind(&account.password)
        .execute(self)
        .await
        .map_err(map_insert_error)?;
        Ok(account.account_id)
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"SELECT account_id, name, email, document, password FROM account WHERE account_id = ?1"#,
        )
        .bind(account_id.to_string())
        .fetch_optional(self)
        .await?;
        row.map(account_from_row).transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"SELECT account_id, name, email, document, password FROM account WHERE email = ?1"#,
        )
        .bind(email)
        .fetch_optional(self)
        .await?;
        row.map(account_from_row).transpose()
    }

    async fn upsert_holding_add(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<(), StorageError> {
        let mut conn = self.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = add_quantity(&mut conn, account_id, asset_id, delta).await;
        finish(&mut conn, result).await
    }

    async fn get_holding(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
    ) -> Result<Option<Holding>, StorageError> {
        let mut conn = self.acquire().await?;
        let quantity = read_quantity(&mut conn, account_id, asset_id).await?;
        Ok(quantity.map(|quantity| Holding {
            account_id,
            asset_id,
            quantity,
        }))
    }

    async fn subtract_holding_if_sufficient(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<Debit, StorageError> {
        let mut conn = self.acquire().await?;
        begin_immediate(&mut conn).await?;
        let result = take_quantity(&mut conn, account_id, asset_id, delta).await;
        finish(&mut conn, result).await
    }

    async fn list_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>, StorageError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"SELECT asset_id, quantity FROM account_asset WHERE account_id = ?1 ORDER BY asset_id"#,
        )
        .bind(account_id.to_string())
        .fetch_all(self)
        .await?;
        rows.into_iter()
            .map(|(asset_id, quantity)| {
                Ok(Holding {
                    account_id,
                    asset_id: parse_asset(&asset_id)?,
                    quantity: parse_quantity(&quantity)?,
                })
            })
            .collect()
    }

    async fn save_order(&self, order: &Order) -> Result<Uuid, StorageError> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, market_id, account_id, side, quantity, price,
                                fill_quantity, fill_price, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
        )
        .bind(order.order_id.to_string())
        .bind(&order.market_id)
        .bind(order.account_id.to_string())
        .bind(order.side.as_str())
        .bind(order.quantity.to_string())
        .bind(order.price.to_string())
        .bind(order.fill_quantity.to_string())
        .bind(order.fill_price.to_string())
        .bind(order.status.as_str())
        // Fixed-width UTC text sorts chronologically.
        .bind(order.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(self)
        .await?;
        Ok(order.order_id)
    }

    async fn list_orders(
        &self,
        account_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StorageError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_id, market_id, account_id, side, quantity, price,
                   fill_quantity, fill_price, status, created_at
            FROM orders
            WHERE account_id = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at, order_id"#,
        )
        .bind(account_id.to_string())
        .bind(status.map(|status| status.as_str()))
        .fetch_all(self)
        .await?;
        rows.into_iter().map(order_from_row).collect()
    }
}
