use std::sync::Arc;

use uuid::Uuid;

use super::{
    model::{Account, AccountView, InitialDeposit, SignupInput},
    repo::LedgerRepository,
};
use crate::{
    asset::service::AssetService,
    constants::{
        ACCOUNT_ID_REQUIRED, ACCOUNT_NOT_FOUND, EMAIL_EXISTS, FAILED_CHECK_EMAIL,
        FAILED_CREATE_ACCOUNT, FAILED_RETRIEVE_ACCOUNT, INVALID_ACCOUNT_ID, INVALID_DOCUMENT,
        INVALID_EMAIL, INVALID_NAME, INVALID_PASSWORD,
    },
    error::{LedgerError, StorageError},
    validation::{clean_document, is_document_valid, is_email_valid, is_name_valid, is_password_valid},
};

/// Parses a client-supplied account identifier.
pub fn parse_account_id(account_id: &str) -> Result<Uuid, LedgerError> {
    if account_id.is_empty() {
        return Err(LedgerError::Validation(ACCOUNT_ID_REQUIRED));
    }
    Uuid::parse_str(account_id).map_err(|_| LedgerError::Validation(INVALID_ACCOUNT_ID))
}

pub struct AccountService {
    repository: Arc<dyn LedgerRepository>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        AccountService { repository }
    }

    /// Validates in a fixed order (name, email, email uniqueness, password,
    /// document) and stops at the first failure.
    pub async fn signup(&self, input: SignupInput) -> Result<Uuid, LedgerError> {
        self.validate_signup(&input).await?;
        self.create_account(input).await
    }

    /// Runs the signup checks, then checks every deposit, and only then
    /// writes the account and its holdings.
    pub async fn signup_with_initial_assets(
        &self,
        input: SignupInput,
        deposits: &[InitialDeposit],
        assets: &AssetService,
    ) -> Result<Uuid, LedgerError> {
        self.validate_signup(&input).await?;
        let checked = deposits
            .iter()
            .map(|deposit| AssetService::check_movement(&deposit.asset_id, deposit.quantity))
            .collect::<Result<Vec<_>, _>>()?;
        let account_id = self.create_account(input).await?;
        for (asset_id, quantity) in checked {
            assets.credit(account_id, asset_id, quantity).await?;
        }
        Ok(account_id)
    }

    async fn create_account(&self, input: SignupInput) -> Result<Uuid, LedgerError> {
        let account = Account {
            account_id: Uuid::new_v4(),
            document: clean_document(&input.document),
            name: input.name,
            email: input.email,
            password: input.password,
        };
        let account_id = self
            .repository
            .create_account(&account)
            .await
            .map_err(|e| match e {
                StorageError::DuplicateEmail => LedgerError::Conflict(EMAIL_EXISTS),
                e => {
                    tracing::error!(error = ?e, "failed to persist account");
                    LedgerError::Storage(FAILED_CREATE_ACCOUNT, e)
                }
            })?;
        tracing::info!(%account_id, "account created");
        Ok(account_id)
    }

    pub async fn get_account(&self, account_id: &str) -> Result<AccountView, LedgerError> {
        let account_id = parse_account_id(account_id)?;
        let account = self.require_account(account_id).await?;
        let holdings = self
            .repository
            .list_holdings(account_id)
            .await
            .map_err(|e| {
                tracing::error!(%account_id, error = ?e, "failed to list holdings");
                LedgerError::Storage(FAILED_RETRIEVE_ACCOUNT, e)
            })?;
        Ok(AccountView::new(account, holdings))
    }

    pub async fn require_account(&self, account_id: Uuid) -> Result<Account, LedgerError> {
        require_account(self.repository.as_ref(), account_id).await
    }

    async fn validate_signup(&self, input: &SignupInput) -> Result<(), LedgerError> {
        if !is_name_valid(&input.name) {
            return Err(reject(INVALID_NAME));
        }
        if !is_email_valid(&input.email) {
            return Err(reject(INVALID_EMAIL));
        }
        let existing = self
            .repository
            .find_account_by_email(&input.email)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "failed to look up email");
                LedgerError::Storage(FAILED_CHECK_EMAIL, e)
            })?;
        if existing.is_some() {
            tracing::debug!("signup rejected: email already registered");
            return Err(LedgerError::Conflict(EMAIL_EXISTS));
        }
        if !is_password_valid(&input.password) {
            return Err(reject(INVALID_PASSWORD));
        }
        if !is_document_valid(&input.document) {
            return Err(reject(INVALID_DOCUMENT));
        }
        Ok(())
    }
}

pub(crate) async fn require_account(
    repository: &dyn LedgerRepository,
    account_id: Uuid,
) -> Result<Account, LedgerError> {
    match repository.find_account_by_id(account_id).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(LedgerError::NotFound(ACCOUNT_NOT_FOUND)),
        Err(e) => {
            tracing::error!(%account_id, error = ?e, "failed to load account");
            Err(LedgerError::Storage(FAILED_RETRIEVE_ACCOUNT, e))
        }
    }
}

fn reject(message: &'static str) -> LedgerError {
    tracing::debug!(reason = message, "signup rejected");
    LedgerError::Validation(message)
}
