use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{OrderInput, service::OrderService};
use crate::{
    account::{
        controller::{error_response, json_response, ledger_error_response},
        repo::LedgerRepository,
    },
    constants::{BAD_REQUEST, INVALID_REQUEST},
    utils::{des_from_str, parse_quantity},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest {
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    market_id: String,
    #[serde(default)]
    side: String,
    quantity: Option<Value>,
    price: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: String,
}

pub struct OrderController {
    orders: OrderService,
}

impl OrderController {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        OrderController {
            orders: OrderService::new(repository),
        }
    }

    pub async fn execute_order(&self, body: &str) -> (String, String) {
        let request: OrderRequest = match des_from_str(body) {
            Ok(request) => request,
            Err(_) => return error_response(BAD_REQUEST, INVALID_REQUEST),
        };
        let input = OrderInput {
            market_id: request.market_id,
            side: request.side,
            quantity: parse_quantity(request.quantity.as_ref()),
            price: parse_quantity(request.price.as_ref()),
        };
        match self.orders.execute_order(&request.account_id, input).await {
            Ok(order_id) => json_response(&OrderResponse {
                order_id: order_id.to_string(),
            }),
            Err(err) => ledger_error_response(&err),
        }
    }

    pub async fn get_orders(&self, account_id: &str, status: Option<&str>) -> (String, String) {
        match self.orders.get_orders(account_id, status).await {
            Ok(orders) => json_response(&orders),
            Err(err) => ledger_error_response(&err),
        }
    }
}
