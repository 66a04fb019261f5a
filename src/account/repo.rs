pub mod memory;
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::Account;
use crate::{
    asset::{AssetId, Holding},
    error::StorageError,
    order::{Order, OrderSide, OrderStatus},
};

pub use memory::MemoryRepository;

/// Result of a guarded decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debit {
    Applied,
    Insufficient,
    Missing,
}

/// Storage seam for accounts and holdings. Balance mutations must be atomic
/// per `(account_id, asset_id)` key; implementations never read-then-write
/// without a guard.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn create_account(&self, account: &Account) -> Result<Uuid, StorageError>;

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StorageError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError>;

    /// Adds `delta` to the holding, creating it with `delta` when absent.
    async fn upsert_holding_add(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<(), StorageError>;

    async fn get_holding(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
    ) -> Result<Option<Holding>, StorageError>;

    /// Subtracts `delta` only if the current quantity covers it.
    async fn subtract_holding_if_sufficient(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<Debit, StorageError>;

    async fn list_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>, StorageError>;

    async fn save_order(&self, order: &Order) -> Result<Uuid, StorageError>;

    /// Orders of one account, oldest first.
    async fn list_orders(
        &self,
        account_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StorageError>;
}

pub(crate) fn map_insert_error(error: sqlx::Error) -> StorageError {
    match error {
        sqlx::Error::Database(err) if err.is_unique_violation() => StorageError::DuplicateEmail,
        e => StorageError::Database(e),
    }
}

pub(crate) fn parse_asset(value: &str) -> Result<AssetId, StorageError> {
    value
        .parse()
        .map_err(|_| StorageError::Corrupt(format!("asset_id '{}'", value)))
}

pub(crate) fn parse_side(value: &str) -> Result<OrderSide, StorageError> {
    value
        .parse()
        .map_err(|_| StorageError::Corrupt(format!("side '{}'", value)))
}

pub(crate) fn parse_status(value: &str) -> Result<OrderStatus, StorageError> {
    value
        .parse()
        .map_err(|_| StorageError::Corrupt(format!("status '{}'", value)))
}

pub(crate) fn overflow(account_id: Uuid, asset_id: AssetId) -> StorageError {
    StorageError::Overflow(format!("{}/{}", account_id, asset_id))
}
