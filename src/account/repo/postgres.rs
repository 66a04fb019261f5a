use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Debit, LedgerRepository, map_insert_error, parse_asset, parse_side, parse_status};
use crate::{
    account::model::Account,
    asset::{AssetId, Holding},
    error::StorageError,
    order::{Order, OrderStatus},
};

type AccountRow = (Uuid, String, String, String, String);
type OrderRow = (
    Uuid,
    String,
    Uuid,
    String,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    String,
    DateTime<Utc>,
);

fn account_from_row((account_id, name, email, document, password): AccountRow) -> Account {
    Account {
        account_id,
        name,
        email,
        document,
        password,
    }
}

fn order_from_row(row: OrderRow) -> Result<Order, StorageError> {
    let (order_id, market_id, account_id, side, quantity, price, fill_quantity, fill_price, status, timestamp) =
        row;
    Ok(Order {
        order_id,
        market_id,
        account_id,
        side: parse_side(&side)?,
        quantity,
        price,
        fill_quantity,
        fill_price,
        status: parse_status(&status)?,
        timestamp,
    })
}

// Balance updates are single statements; Postgres row locks serialise
// concurrent writers on the same key.
#[async_trait]
impl LedgerRepository for PgPool {
    async fn create_account(&self, account: &Account) -> Result<Uuid, StorageError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO account (account_id, name, email, document, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING account_id"#,
        )
        .bind(account.account_id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.document)
        .bind(&account.password)
        .fetch_one(self)
        .await
        .map_err(map_insert_error)?;
        Ok(row.0)
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"SELECT account_id, name, email, document, password FROM account WHERE account_id = $1"#,
        )
        .bind(account_id)
        .fetch_optional(self)
        .await?;
        Ok(row.map(account_from_row))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"SELECT account_id, name, email, document, password FROM account WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(self)
        .await?;
        Ok(row.map(account_from_row))
    }

    async fn upsert_holding_add(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO account_asset (account_id, asset_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id, asset_id)
            DO UPDATE SET quantity = account_asset.quantity + EXCLUDED.quantity"#,
        )
        .bind(account_id)
        .bind(asset_id.as_str())
        .bind(delta)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn get_holding(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
    ) -> Result<Option<Holding>, StorageError> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"SELECT quantity FROM account_asset WHERE account_id = $1 AND asset_id = $2"#,
        )
        .bind(account_id)
        .bind(asset_id.as_str())
        .fetch_optional(self)
        .await?;
        Ok(row.map(|(quantity,)| Holding {
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
        let result = sqlx::query(
            r#"
            UPDATE account_asset
            SET quantity = quantity - $3
            WHERE account_id = $1 AND asset_id = $2 AND quantity >= $3"#,
        )
        .bind(account_id)
        .bind(asset_id.as_str())
        .bind(delta)
        .execute(self)
        .await?;
        if result.rows_affected() == 1 {
            return Ok(Debit::Applied);
        }
        match self.get_holding(account_id, asset_id).await? {
            Some(_) => Ok(Debit::Insufficient),
            None => Ok(Debit::Missing),
        }
    }

    async fn list_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>, StorageError> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as(
            r#"SELECT asset_id, quantity FROM account_asset WHERE account_id = $1 ORDER BY asset_id"#,
        )
        .bind(account_id)
        .fetch_all(self)
        .await?;
        rows.into_iter()
            .map(|(asset_id, quantity)| {
                Ok(Holding {
                    account_id,
                    asset_id: parse_asset(&asset_id)?,
                    quantity,
                })
            })
            .collect()
    }

    async fn save_order(&self, order: &Order) -> Result<Uuid, StorageError> {
        let row: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO orders (order_id, market_id, account_id, side, quantity, price,
                                fill_quantity, fill_price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING order_id"#,
        )
        .bind(order.order_id)
        .bind(&order.market_id)
        .bind(order.account_id)
        .bind(order.side.as_str())
        .bind(order.quantity)
        .bind(order.price)
        .bind(order.fill_quantity)
        .bind(order.fill_price)
        .bind(order.status.as_str())
        .bind(order.timestamp)
        .fetch_one(self)
        .await?;
        Ok(row.0)
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
            WHERE account_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at, order_id"#,
        )
        .bind(account_id)
        .bind(status.map(|status| status.as_str()))
        .fetch_all(self)
        .await?;
        rows.into_iter().map(order_from_row).collect()
    }
}
