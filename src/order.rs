pub mod controller;
pub mod service;

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::asset::AssetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl FromStr for OrderSide {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(OrderStatus::Open),
            "closed" => Ok(OrderStatus::Closed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

/// Trading pair written as `BASE/QUOTE`, e.g. `BTC/USD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Market {
    pub base: AssetId,
    pub quote: AssetId,
}

impl FromStr for Market {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownVariant(value.to_string());
        let (base, quote) = value.split_once('/').ok_or_else(unknown)?;
        let base: AssetId = base.parse().map_err(|_| unknown())?;
        let quote: AssetId = quote.parse().map_err(|_| unknown())?;
        if base == quote {
            return Err(unknown());
        }
        Ok(Market { base, quote })
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// An order placed by an account. Orders are recorded as submitted; nothing
/// matches or fills them, so `fill_quantity` / `fill_price` stay at zero
/// until an external process updates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: Uuid,
    pub market_id: String,
    pub account_id: Uuid,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fill_quantity: Decimal,
    pub fill_price: Decimal,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderInput {
    pub market_id: String,
    pub side: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
}
