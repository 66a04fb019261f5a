use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::AssetId;
use crate::{
    account::{
        repo::{Debit, LedgerRepository},
        service::{parse_account_id, require_account},
    },
    constants::{
        FAILED_UPDATE_BALANCE, HOLDING_NOT_FOUND, INSUFFICIENT_BALANCE, INVALID_ASSET_ID,
        INVALID_QUANTITY,
    },
    error::LedgerError,
};

/// Deposit and withdrawal against per-asset holdings.
pub struct AssetService {
    repository: Arc<dyn LedgerRepository>,
}

impl AssetService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        AssetService { repository }
    }

    /// Validates the asset identifier and quantity of a balance movement.
    pub fn check_movement(
        asset_id: &str,
        quantity: Option<Decimal>,
    ) -> Result<(AssetId, Decimal), LedgerError> {
        let asset_id: AssetId = asset_id
            .parse()
            .map_err(|_| LedgerError::Validation(INVALID_ASSET_ID))?;
        let quantity = check_quantity(quantity)?;
        Ok((asset_id, quantity))
    }

    pub async fn deposit(
        &self,
        account_id: &str,
        asset_id: &str,
        quantity: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        let account_id = parse_account_id(account_id)?;
        let (asset_id, quantity) = Self::check_movement(asset_id, quantity)?;
        require_account(self.repository.as_ref(), account_id).await?;
        self.credit(account_id, asset_id, quantity).await
    }

    /// Adds `quantity` to an already validated account's holding.
    pub(crate) async fn credit(
        &self,
        account_id: Uuid,
        asset_id: AssetId,
        quantity: Decimal,
    ) -> Result<(), LedgerError> {
        self.repository
            .upsert_holding_add(account_id, asset_id, quantity)
            .await
            .map_err(|e| {
                tracing::error!(%account_id, %asset_id, error = ?e, "deposit failed");
                LedgerError::Storage(FAILED_UPDATE_BALANCE, e)
            })?;
        tracing::info!(%account_id, %asset_id, %quantity, "deposit applied");
        Ok(())
    }

    /// Rejects the whole request when the holding does not cover `quantity`;
    /// there are no partial withdrawals.
    pub async fn withdraw(
        &self,
        account_id: &str,
        asset_id: &str,
        quantity: Option<Decimal>,
    ) -> Result<(), LedgerError> {
        let (asset_id, quantity) = Self::check_movement(asset_id, quantity)?;
        let account_id = parse_account_id(account_id)?;
        require_account(self.repository.as_ref(), account_id).await?;

        let holding = self
            .repository
            .get_holding(account_id, asset_id)
            .await
            .map_err(|e| {
                tracing::error!(%account_id, %asset_id, error = ?e, "failed to load holding");
                LedgerError::Storage(FAILED_UPDATE_BALANCE, e)
            })?
            .ok_or(LedgerError::NotFound(HOLDING_NOT_FOUND))?;
        if holding.quantity < quantity {
            tracing::debug!(%account_id, %asset_id, "withdrawal exceeds holding");
            return Err(LedgerError::InsufficientBalance(INSUFFICIENT_BALANCE));
        }

        let debit = self
            .repository
            .subtract_holding_if_sufficient(account_id, asset_id, quantity)
            .await
            .map_err(|e| {
                tracing::error!(%account_id, %asset_id, error = ?e, "withdrawal failed");
                LedgerError::Storage(FAILED_UPDATE_BALANCE, e)
            })?;
        match debit {
            Debit::Applied => {
                tracing::info!(%account_id, %asset_id, %quantity, "withdrawal applied");
                Ok(())
            }
            // A concurrent withdrawal drained the holding after the check above.
            Debit::Insufficient => Err(LedgerError::InsufficientBalance(INSUFFICIENT_BALANCE)),
            Debit::Missing => Err(LedgerError::NotFound(HOLDING_NOT_FOUND)),
        }
    }
}

fn check_quantity(quantity: Option<Decimal>) -> Result<Decimal, LedgerError> {
    match quantity {
        Some(quantity) if !quantity.is_sign_negative() || quantity.is_zero() => Ok(quantity),
        _ => Err(LedgerError::Validation(INVALID_QUANTITY)),
    }
}
