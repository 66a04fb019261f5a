pub mod service;

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetId {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "USD")]
    Usd,
}

impl AssetId {
    pub const ALL: [AssetId; 2] = [AssetId::Btc, AssetId::Usd];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetId::Btc => "BTC",
            AssetId::Usd => "USD",
        }
    }

    /// Case-sensitive membership check against the supported assets.
    pub fn is_valid(value: &str) -> bool {
        value.parse::<AssetId>().is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset '{0}'")]
pub struct UnknownAsset(pub String);

impl FromStr for AssetId {
    type Err = UnknownAsset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "BTC" => Ok(AssetId::Btc),
            "USD" => Ok(AssetId::Usd),
            other => Err(UnknownAsset(other.to_string())),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantity of one asset owned by one account. Keyed by `(account_id, asset_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub account_id: Uuid,
    pub asset_id: AssetId,
    pub quantity: Decimal,
}
