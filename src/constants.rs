pub const OK_RESPONSE: &str = "HTTP/1.1 200 OK";
pub const BAD_REQUEST: &str = "HTTP/1.1 400 Bad Request";
pub const NOT_FOUND: &str = "HTTP/1.1 404 NOT FOUND";
pub const CONFLICT: &str = "HTTP/1.1 409 Conflict";
pub const UNPROCESSABLE: &str = "HTTP/1.1 422 Unprocessable Entity";
pub const INTERNAL_ERROR: &str = "HTTP/1.1 500 INTERNAL ERROR";

// Client-visible error messages. Tests and callers compare these verbatim.
pub const INVALID_REQUEST: &str = "Invalid request";
pub const INVALID_NAME: &str = "Invalid name";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const EMAIL_EXISTS: &str = "Email already exists";
pub const INVALID_PASSWORD: &str = "Invalid password";
pub const INVALID_DOCUMENT: &str = "Invalid document";
pub const ACCOUNT_ID_REQUIRED: &str = "accountId is required";
pub const INVALID_ACCOUNT_ID: &str = "Invalid accountId";
pub const INVALID_ASSET_ID: &str = "assetId is required and must be valid";
pub const INVALID_QUANTITY: &str = "quantity is required and must be a valid positive integer";
pub const ACCOUNT_NOT_FOUND: &str = "Account not found";
pub const HOLDING_NOT_FOUND: &str = "Account or asset not found";
pub const INSUFFICIENT_BALANCE: &str = "Insufficient balance";
pub const INVALID_MARKET_ID: &str = "marketId is required and must be valid";
pub const INVALID_SIDE: &str = "side is required and must be buy or sell";
pub const INVALID_ORDER_QUANTITY: &str = "quantity is required and must be greater than zero";
pub const INVALID_PRICE: &str = "price is required and must be greater than zero";
pub const INVALID_ORDER_STATUS: &str = "status must be open or closed";

pub const FAILED_CHECK_EMAIL: &str = "Failed to check email";
pub const FAILED_CREATE_ACCOUNT: &str = "Failed to create account";
pub const FAILED_RETRIEVE_ACCOUNT: &str = "Failed to retrieve account";
pub const FAILED_UPDATE_BALANCE: &str = "Failed to update balance";
pub const FAILED_SAVE_ORDER: &str = "Failed to save order";
pub const FAILED_RETRIEVE_ORDERS: &str = "Failed to retrieve orders";

pub const DEPOSIT_COMPLETED: &str = "Deposit completed";
pub const WITHDRAW_COMPLETED: &str = "Withdraw completed";
