use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::{AssetId, Holding};

/// Persisted account record. `document` holds the cleaned eleven digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    pub document: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub password: String,
}

/// A deposit to apply right after the account is created.
#[derive(Debug, Clone)]
pub struct InitialDeposit {
    pub asset_id: String,
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub asset_id: AssetId,
    pub quantity: Decimal,
}

impl From<Holding> for AssetBalance {
    fn from(holding: Holding) -> Self {
        AssetBalance {
            asset_id: holding.asset_id,
            quantity: holding.quantity.normalize(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub account_id: Uuid,
    pub name: String,
    pub email: String,
    pub document: String,
    pub assets: Vec<AssetBalance>,
}

impl AccountView {
    pub fn new(account: Account, holdings: Vec<Holding>) -> Self {
        AccountView {
            account_id: account.account_id,
            name: account.name,
            email: account.email,
            document: account.document,
            assets: holdings.into_iter().map(AssetBalance::from).collect(),
        }
    }

    pub fn quantity_of(&self, asset_id: AssetId) -> Option<Decimal> {
        self.assets
            .iter()
            .find(|balance| balance.asset_id == asset_id)
            .map(|balance| balance.quantity)
    }
}
