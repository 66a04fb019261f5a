use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    model::{InitialDeposit, SignupInput},
    repo::LedgerRepository,
    service::AccountService,
};
use crate::{
    asset::service::AssetService,
    constants::{
        BAD_REQUEST, CONFLICT, DEPOSIT_COMPLETED, INTERNAL_ERROR, INVALID_REQUEST, NOT_FOUND,
        OK_RESPONSE, UNPROCESSABLE, WITHDRAW_COMPLETED,
    },
    error::LedgerError,
    utils::{des_from_str, parse_quantity, ser_to_str},
};

#[derive(Deserialize)]
struct SignupRequest {
    #[serde(flatten)]
    account: SignupInput,
    #[serde(default)]
    assets: Vec<InitialAssetRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialAssetRequest {
    #[serde(default)]
    asset_id: String,
    quantity: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovementRequest {
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    asset_id: String,
    quantity: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupResponse {
    account_id: String,
}

#[derive(Serialize)]
struct MessageResponse<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

/// Translates request bodies into service calls and results into
/// `(status line, json body)` pairs.
pub struct AccountController {
    accounts: AccountService,
    assets: AssetService,
}

impl AccountController {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        AccountController {
            accounts: AccountService::new(Arc::clone(&repository)),
            assets: AssetService::new(repository),
        }
    }

    pub async fn signup(&self, body: &str) -> (String, String) {
        let request: SignupRequest = match des_from_str(body) {
            Ok(request) => request,
            Err(_) => return error_response(BAD_REQUEST, INVALID_REQUEST),
        };
        let deposits: Vec<InitialDeposit> = request
            .assets
            .iter()
            .map(|asset| InitialDeposit {
                asset_id: asset.asset_id.clone(),
                quantity: parse_quantity(asset.quantity.as_ref()),
            })
            .collect();
        let result = if deposits.is_empty() {
            self.accounts.signup(request.account).await
        } else {
            self.accounts
                .signup_with_initial_assets(request.account, &deposits, &self.assets)
                .await
        };
        match result {
            Ok(account_id) => json_response(&SignupResponse {
                account_id: account_id.to_string(),
            }),
            Err(err) => ledger_error_response(&err),
        }
    }

    pub async fn get_account(&self, account_id: &str) -> (String, String) {
        match self.accounts.get_account(account_id).await {
            Ok(view) => json_response(&view),
            Err(err) => ledger_error_response(&err),
        }
    }

    pub async fn deposit(&self, body: &str) -> (String, String) {
        let request: MovementRequest = match des_from_str(body) {
            Ok(request) => request,
            Err(_) => return error_response(BAD_REQUEST, INVALID_REQUEST),
        };
        let quantity = parse_quantity(request.quantity.as_ref());
        match self
            .assets
            .deposit(&request.account_id, &request.asset_id, quantity)
            .await
        {
            Ok(()) => json_response(&MessageResponse {
                message: DEPOSIT_COMPLETED,
            }),
            Err(err) => ledger_error_response(&err),
        }
    }

    pub async fn withdraw(&self, body: &str) -> (String, String) {
        let request: MovementRequest = match des_from_str(body) {
            Ok(request) => request,
            Err(_) => return error_response(BAD_REQUEST, INVALID_REQUEST),
        };
        let quantity = parse_quantity(request.quantity.as_ref());
        match self
            .assets
            .withdraw(&request.account_id, &request.asset_id, quantity)
            .await
        {
            Ok(()) => json_response(&MessageResponse {
                message: WITHDRAW_COMPLETED,
            }),
            Err(err) => ledger_error_response(&err),
        }
    }
}

pub(crate) fn json_response<T: Serialize>(body: &T) -> (String, String) {
    match ser_to_str(body) {
        Ok(json) => (OK_RESPONSE.to_string(), json),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            (INTERNAL_ERROR.to_string(), "".to_string())
        }
    }
}

pub(crate) fn error_response(status: &str, message: &str) -> (String, String) {
    let body = ser_to_str(&ErrorResponse { error: message }).unwrap_or_default();
    (status.to_string(), body)
}

pub(crate) fn ledger_error_response(err: &LedgerError) -> (String, String) {
    let status = match err {
        LedgerError::Validation(_) => BAD_REQUEST,
        LedgerError::NotFound(_) => NOT_FOUND,
        LedgerError::Conflict(_) => CONFLICT,
        LedgerError::InsufficientBalance(_) => UNPROCESSABLE,
        LedgerError::Storage(..) => INTERNAL_ERROR,
    };
    error_response(status, err.message())
}
