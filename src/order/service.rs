use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Market, Order, OrderInput, OrderSide, OrderStatus};
use crate::{
    account::{
        repo::LedgerRepository,
        service::{parse_account_id, require_account},
    },
    constants::{
        FAILED_RETRIEVE_ORDERS, FAILED_SAVE_ORDER, INVALID_MARKET_ID, INVALID_ORDER_QUANTITY,
        INVALID_ORDER_STATUS, INVALID_PRICE, INVALID_SIDE,
    },
    error::LedgerError,
};

pub struct OrderService {
    repository: Arc<dyn LedgerRepository>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        OrderService { repository }
    }

    /// Records a new open order for an existing account and returns its id.
    /// The account is resolved first, then market, side, quantity and price.
    pub async fn execute_order(
        &self,
        account_id: &str,
        input: OrderInput,
    ) -> Result<Uuid, LedgerError> {
        let account_id = parse_account_id(account_id)?;
        require_account(self.repository.as_ref(), account_id).await?;

        let market: Market = input
            .market_id
            .parse()
            .map_err(|_| LedgerError::Validation(INVALID_MARKET_ID))?;
        let side: OrderSide = input
            .side
            .parse()
            .map_err(|_| LedgerError::Validation(INVALID_SIDE))?;
        let quantity = positive(input.quantity, INVALID_ORDER_QUANTITY)?;
        let price = positive(input.price, INVALID_PRICE)?;

        let order = Order {
            order_id: Uuid::new_v4(),
            market_id: market.to_string(),
            account_id,
            side,
            quantity,
            price,
            fill_quantity: Decimal::ZERO,
            fill_price: Decimal::ZERO,
            status: OrderStatus::Open,
            // Postgres keeps microseconds.
            timestamp: Utc::now().trunc_subsecs(6),
        };
        let order_id = self.repository.save_order(&order).await.map_err(|e| {
            tracing::error!(%account_id, error = ?e, "failed to save order");
            LedgerError::Storage(FAILED_SAVE_ORDER, e)
        })?;
        tracing::info!(%account_id, %order_id, market = %market, side = side.as_str(), "order placed");
        Ok(order_id)
    }

    /// Orders of `account_id`, oldest first, optionally narrowed to one status.
    /// An empty `status` means no filter.
    pub async fn get_orders(
        &self,
        account_id: &str,
        status: Option<&str>,
    ) -> Result<Vec<Order>, LedgerError> {
        let account_id = parse_account_id(account_id)?;
        let status = match status {
            None | Some("") => None,
            Some(status) => Some(
                status
                    .parse::<OrderStatus>()
                    .map_err(|_| LedgerError::Validation(INVALID_ORDER_STATUS))?,
            ),
        };
        self.repository
            .list_orders(account_id, status)
            .await
            .map_err(|e| {
                tracing::error!(%account_id, error = ?e, "failed to list orders");
                LedgerError::Storage(FAILED_RETRIEVE_ORDERS, e)
            })
    }
}

fn positive(value: Option<Decimal>, message: &'static str) -> Result<Decimal, LedgerError> {
    match value {
        Some(value) if value > Decimal::ZERO => Ok(value),
        _ => Err(LedgerError::Validation(message)),
    }
}
