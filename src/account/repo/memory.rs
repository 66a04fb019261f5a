use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Debit, LedgerRepository, overflow};
use crate::{
    account::model::Account,
    asset::{AssetId, Holding},
    error::StorageError,
    order::{Order, OrderStatus},
};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    email_index: HashMap<String, Uuid>,
    holdings: HashMap<(Uuid, AssetId), Decimal>,
    orders: Vec<Order>,
}

/// Process-local backend. Every operation runs under one lock, which makes
/// each balance mutation a single atomic step.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for MemoryRepository {
    async fn create_account(&self, account: &Account) -> Result<Uuid, StorageError> {
        let mut state = self.state.lock().await;
        if state.email_index.contains_key(&account.email) {
            return Err(StorageError::DuplicateEmail);
        }
        state
            .email_index
            .insert(account.email.clone(), account.account_id);
        state.accounts.insert(account.account_id, account.clone());
        Ok(account.account_id)
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StorageError> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .email_index
            .get(email)
            .and_then(|account_id| state.accounts.get(account_id))
            .cloned())
    }

    async fn upsert_holding_add(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        let quantity = state
            .holdings
            .entry((account_id, asset_id))
            .or_insert(Decimal::ZERO);
        *quantity = quantity
            .checked_add(delta)
            .ok_or_else(|| overflow(account_id, asset_id))?;
        Ok(())
    }

    async fn get_holding(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
    ) -> Result<Option<Holding>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .holdings
            .get(&(account_id, asset_id))
            .map(|quantity| Holding {
                account_id,
                asset_id,
                quantity: *quantity,
            }))
    }

    async fn subtract_holding_if_sufficient(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        delta: Decimal,
    ) -> Result<Debit, StorageError> {
        let mut state = self.state.lock().await;
        match state.holdings.get_mut(&(account_id, asset_id)) {
            None => Ok(Debit::Missing),
            Some(quantity) if *quantity < delta => Ok(Debit::Insufficient),
            Some(quantity) => {
                *quantity -= delta;
                Ok(Debit::Applied)
            }
        }
    }

    async fn list_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>, StorageError> {
        let state = self.state.lock().await;
        let mut holdings: Vec<Holding> = state
            .holdings
            .iter()
            .filter(|((owner, _), _)| *owner == account_id)
            .map(|((_, asset_id), quantity)| Holding {
                account_id,
                asset_id: *asset_id,
                quantity: *quantity,
            })
            .collect();
        holdings.sort_by_key(|holding| holding.asset_id.as_str());
        Ok(holdings)
    }

    async fn save_order(&self, order: &Order) -> Result<Uuid, StorageError> {
        self.state.lock().await.orders.push(order.clone());
        Ok(order.order_id)
    }

    async fn list_orders(
        &self,
        account_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StorageError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|order| order.account_id == account_id)
            .filter(|order| status.is_none_or(|status| order.status == status))
            .cloned()
            .collect())
    }
}
