#![cfg(feature = "sqlite")]

use std::sync::Arc;

use asset_ledger::{
    account::controller::AccountController,
    constants::{
        BAD_REQUEST, CONFLICT, EMAIL_EXISTS, INSUFFICIENT_BALANCE, INTERNAL_ERROR,
        INVALID_ACCOUNT_ID, INVALID_ASSET_ID, INVALID_MARKET_ID, INVALID_NAME,
        INVALID_ORDER_STATUS, INVALID_REQUEST, NOT_FOUND, OK_RESPONSE, UNPROCESSABLE,
    },
    order::controller::OrderController,
    server::{Controllers, Server},
};
use common::{sqlite_repository, unique_email};
use serde_json::{Value, json};
mod common;

const QUANTITY_MESSAGE: &str = "quantity is required and must be a valid positive integer";

async fn controller() -> AccountController {
    AccountController::new(sqlite_repository().await)
}

fn body(response: &(String, String)) -> Value {
    serde_json::from_str(&response.1).expect("response body is json")
}

async fn signup(controller: &AccountController, email: &str) -> String {
    let request = json!({
        "name": "Gustavo B",
        "email": email,
        "document": "11144477735",
        "password": "Senha123",
    });
    let response = controller.signup(&request.to_string()).await;
    assert_eq!(response.0, OK_RESPONSE.to_string());
    body(&response)["accountId"]
        .as_str()
        .expect("accountId in response")
        .to_string()
}

#[tokio::test]
async fn signup_deposit_withdraw_flow() {
    let controller = controller().await;
    let email = unique_email();
    let account_id = signup(&controller, &email).await;

    let duplicate = controller
        .signup(
            &json!({
                "name": "Other Person",
                "email": email,
                "document": "11144477735",
                "password": "Senha123",
            })
            .to_string(),
        )
        .await;
    assert_eq!(duplicate.0, CONFLICT.to_string());
    assert_eq!(body(&duplicate)["error"], EMAIL_EXISTS);

    let deposit = controller
        .deposit(&json!({"accountId": account_id, "assetId": "BTC", "quantity": "10"}).to_string())
        .await;
    assert_eq!(deposit.0, OK_RESPONSE.to_string());
    assert_eq!(body(&deposit)["message"], "Deposit completed");

    let account = controller.get_account(&account_id).await;
    assert_eq!(account.0, OK_RESPONSE.to_string());
    let account = body(&account);
    assert_eq!(account["accountId"], account_id.as_str());
    assert_eq!(account["document"], "11144477735");
    assert!(account.get("password").is_none());
    assert_eq!(account["assets"], json!([{"assetId": "BTC", "quantity": "10"}]));

    let withdraw = controller
        .withdraw(&json!({"accountId": account_id, "assetId": "BTC", "quantity": 5}).to_string())
        .await;
    assert_eq!(withdraw.0, OK_RESPONSE.to_string());
    assert_eq!(body(&withdraw)["message"], "Withdraw completed");

    let overdraft = controller
        .withdraw(&json!({"accountId": account_id, "assetId": "BTC", "quantity": "100"}).to_string())
        .await;
    assert_eq!(overdraft.0, UNPROCESSABLE.to_string());
    assert_eq!(body(&overdraft)["error"], INSUFFICIENT_BALANCE);

    let account = body(&controller.get_account(&account_id).await);
    assert_eq!(account["assets"], json!([{"assetId": "BTC", "quantity": "5"}]));
}

#[tokio::test]
async fn new_account_has_no_assets() {
    let controller = controller().await;
    let account_id = signup(&controller, &unique_email()).await;

    let account = body(&controller.get_account(&account_id).await);

    assert_eq!(account["assets"], json!([]));
    assert_eq!(account["name"], "Gustavo B");
}

#[tokio::test]
async fn signup_with_initial_assets_funds_account() {
    let controller = controller().await;
    let request = json!({
        "name": "Gustavo B",
        "email": unique_email(),
        "document": "111.444.777-35",
        "password": "Senha123",
        "assets": [
            {"assetId": "USD", "quantity": "250.50"},
            {"assetId": "BTC", "quantity": 1},
        ],
    });

    let response = controller.signup(&request.to_string()).await;
    assert_eq!(response.0, OK_RESPONSE.to_string());
    let account_id = body(&response)["accountId"].as_str().unwrap().to_string();

    let account = body(&controller.get_account(&account_id).await);
    assert_eq!(account["document"], "11144477735");
    assert_eq!(
        account["assets"],
        json!([
            {"assetId": "BTC", "quantity": "1"},
            {"assetId": "USD", "quantity": "250.5"},
        ])
    );
}

#[tokio::test]
async fn signup_with_invalid_initial_asset_creates_nothing() {
    let controller = controller().await;
    let email = unique_email();
    let request = json!({
        "name": "Gustavo B",
        "email": email,
        "document": "11144477735",
        "password": "Senha123",
        "assets": [{"assetId": "EUR", "quantity": "1"}],
    });

    let response = controller.signup(&request.to_string()).await;
    assert_eq!(response.0, BAD_REQUEST.to_string());
    assert_eq!(body(&response)["error"], INVALID_ASSET_ID);

    // The email is still free.
    signup(&controller, &email).await;
}

#[tokio::test]
async fn signup_fields_are_checked_before_initial_assets() {
    let controller = controller().await;
    let request = json!({
        "name": "Gustavo",
        "email": unique_email(),
        "document": "11144477735",
        "password": "Senha123",
        "assets": [{"assetId": "EUR", "quantity": "1"}],
    });

    let response = controller.signup(&request.to_string()).await;

    assert_eq!(response.0, BAD_REQUEST.to_string());
    assert_eq!(body(&response)["error"], INVALID_NAME);
}

#[tokio::test]
async fn deposit_overflowing_balance_fails_cleanly() {
    let controller = controller().await;
    let account_id = signup(&controller, &unique_email()).await;
    let request = json!({
        "accountId": account_id,
        "assetId": "USD",
        "quantity": "79228162514264337593543950335",
    })
    .to_string();

    assert_eq!(controller.deposit(&request).await.0, OK_RESPONSE.to_string());
    let overflow = controller.deposit(&request).await;

    assert_eq!(overflow.0, INTERNAL_ERROR.to_string());
    assert_eq!(body(&overflow)["error"], "Failed to update balance");
    let account = body(&controller.get_account(&account_id).await);
    assert_eq!(
        account["assets"],
        json!([{"assetId": "USD", "quantity": "79228162514264337593543950335"}])
    );
}

#[tokio::test]
async fn orders_are_recorded_and_listed() {
    let repository = sqlite_repository().await;
    let accounts = AccountController::new(Arc::clone(&repository));
    let orders = OrderController::new(repository);
    let account_id = signup(&accounts, &unique_email()).await;

    let unknown = orders
        .execute_order(
            &json!({
                "accountId": "6f813af6-f151-4cbf-a423-6135909daa51",
                "marketId": "BTC/USD",
                "side": "buy",
                "quantity": 1,
                "price": 1,
            })
            .to_string(),
        )
        .await;
    assert_eq!(unknown.0, NOT_FOUND.to_string());
    assert_eq!(body(&unknown)["error"], "Account not found");

    let placed = orders
        .execute_order(
            &json!({
                "accountId": account_id,
                "marketId": "BTC/USD",
                "side": "buy",
                "quantity": "1.5",
                "price": 50000,
            })
            .to_string(),
        )
        .await;
    assert_eq!(placed.0, OK_RESPONSE.to_string());
    let order_id = body(&placed)["orderId"].as_str().unwrap().to_string();

    let rejected = orders
        .execute_order(
            &json!({
                "accountId": account_id,
                "marketId": "ETH/USD",
                "side": "sell",
                "quantity": 1,
                "price": 1,
            })
            .to_string(),
        )
        .await;
    assert_eq!(rejected.0, BAD_REQUEST.to_string());
    assert_eq!(body(&rejected)["error"], INVALID_MARKET_ID);

    let listed = body(&orders.get_orders(&account_id, Some("open")).await);
    let listed = listed.as_array().expect("orders array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["orderId"], order_id.as_str());
    assert_eq!(listed[0]["accountId"], account_id.as_str());
    assert_eq!(listed[0]["marketId"], "BTC/USD");
    assert_eq!(listed[0]["side"], "buy");
    assert_eq!(listed[0]["quantity"], "1.5");
    assert_eq!(listed[0]["price"], "50000");
    assert_eq!(listed[0]["fillQuantity"], "0");
    assert_eq!(listed[0]["status"], "open");

    assert_eq!(body(&orders.get_orders(&account_id, Some("closed")).await), json!([]));
    let bad_status = orders.get_orders(&account_id, Some("filled")).await;
    assert_eq!(bad_status.0, BAD_REQUEST.to_string());
    assert_eq!(body(&bad_status)["error"], INVALID_ORDER_STATUS);
}

#[tokio::test]
async fn invalid_deposit_requests() {
    let controller = controller().await;
    let account_id = signup(&controller, &unique_email()).await;

    let cases = [
        (json!({"assetId": "BTC", "quantity": "10"}), "accountId is required"),
        (json!({"accountId": "", "assetId": "BTC", "quantity": "10"}), "accountId is required"),
        (json!({"accountId": "INVALID", "assetId": "BTC", "quantity": "10"}), INVALID_ACCOUNT_ID),
        (json!({"accountId": account_id, "quantity": "10"}), INVALID_ASSET_ID),
        (json!({"accountId": account_id, "assetId": "INVALID", "quantity": "10"}), INVALID_ASSET_ID),
        (json!({"accountId": account_id, "assetId": "BTC"}), QUANTITY_MESSAGE),
        (json!({"accountId": account_id, "assetId": "BTC", "quantity": "-10"}), QUANTITY_MESSAGE),
        (json!({"accountId": account_id, "assetId": "BTC", "quantity": "invalid"}), QUANTITY_MESSAGE),
    ];

    for (request, expected) in cases {
        let response = controller.deposit(&request.to_string()).await;
        assert_eq!(response.0, BAD_REQUEST.to_string(), "request {}", request);
        assert_eq!(body(&response)["error"], expected, "request {}", request);
    }

    let account = body(&controller.get_account(&account_id).await);
    assert_eq!(account["assets"], json!([]));
}

#[tokio::test]
async fn withdraw_edge_cases() {
    let controller = controller().await;
    let account_id = signup(&controller, &unique_email()).await;

    let no_holding = controller
        .withdraw(&json!({"accountId": account_id, "assetId": "USD", "quantity": "0"}).to_string())
        .await;
    assert_eq!(no_holding.0, NOT_FOUND.to_string());
    assert_eq!(body(&no_holding)["error"], "Account or asset not found");

    controller
        .deposit(&json!({"accountId": account_id, "assetId": "USD", "quantity": "3"}).to_string())
        .await;
    let zero = controller
        .withdraw(&json!({"accountId": account_id, "assetId": "USD", "quantity": "0"}).to_string())
        .await;
    assert_eq!(zero.0, OK_RESPONSE.to_string());

    let unknown_account = controller
        .withdraw(
            &json!({
                "accountId": "6f813af6-f151-4cbf-a423-6135909daa51",
                "assetId": "USD",
                "quantity": "1",
            })
            .to_string(),
        )
        .await;
    assert_eq!(unknown_account.0, NOT_FOUND.to_string());
    assert_eq!(body(&unknown_account)["error"], "Account not found");

    let account = body(&controller.get_account(&account_id).await);
    assert_eq!(account["assets"], json!([{"assetId": "USD", "quantity": "3"}]));
}

#[tokio::test]
async fn malformed_bodies_and_unknown_accounts() {
    let controller = controller().await;

    let response = controller.signup("not json").await;
    assert_eq!(response.0, BAD_REQUEST.to_string());
    assert_eq!(body(&response)["error"], INVALID_REQUEST);

    let response = controller.get_account("not-a-uuid").await;
    assert_eq!(response.0, BAD_REQUEST.to_string());
    assert_eq!(body(&response)["error"], INVALID_ACCOUNT_ID);

    let response = controller
        .get_account("6f813af6-f151-4cbf-a423-6135909daa51")
        .await;
    assert_eq!(response.0, NOT_FOUND.to_string());
    assert_eq!(body(&response)["error"], "Account not found");
}

#[tokio::test]
async fn server_routes_raw_http_requests() {
    let controller = Controllers::new(sqlite_repository().await);
    let payload = json!({
        "name": "Gustavo B",
        "email": unique_email(),
        "document": "11144477735",
        "password": "Senha123",
    })
    .to_string();
    let raw = format!(
        "POST /signup HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    );

    let mut output = Vec::new();
    Server::handle_client(raw.as_bytes(), &mut output, &controller)
        .await
        .expect("request handled");

    let response = String::from_utf8(output).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{}", response);
    let (_, content) = response.split_once("\r\n\r\n").unwrap();
    let account_id = serde_json::from_str::<Value>(content).unwrap()["accountId"]
        .as_str()
        .unwrap()
        .to_string();

    let raw = format!("GET /accounts/{} HTTP/1.1\r\nHost: localhost\r\n\r\n", account_id);
    let mut output = Vec::new();
    Server::handle_client(raw.as_bytes(), &mut output, &controller)
        .await
        .expect("request handled");
    let response = String::from_utf8(output).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{}", response);
    assert!(response.contains(&account_id));

    let payload = json!({
        "accountId": account_id,
        "marketId": "BTC/USD",
        "side": "sell",
        "quantity": 2,
        "price": "31000.5",
    })
    .to_string();
    let raw = format!(
        "POST /orders HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{}",
        payload.len(),
        payload
    );
    let mut output = Vec::new();
    Server::handle_client(raw.as_bytes(), &mut output, &controller)
        .await
        .expect("request handled");
    assert!(String::from_utf8(output).unwrap().starts_with("HTTP/1.1 200 OK\r\n"));

    let raw = format!(
        "GET /accounts/{}/orders?status=open HTTP/1.1\r\nHost: localhost\r\n\r\n",
        account_id
    );
    let mut output = Vec::new();
    Server::handle_client(raw.as_bytes(), &mut output, &controller)
        .await
        .expect("request handled");
    let response = String::from_utf8(output).unwrap();
    let (_, content) = response.split_once("\r\n\r\n").unwrap();
    let orders: Value = serde_json::from_str(content).unwrap();
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
    assert_eq!(orders[0]["side"], "sell");

    let mut output = Vec::new();
    Server::handle_client(&b"GET /nowhere HTTP/1.1\r\n\r\n"[..], &mut output, &controller)
        .await
        .expect("request handled");
    assert!(String::from_utf8(output).unwrap().starts_with(NOT_FOUND));
}
