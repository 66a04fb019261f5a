pub mod account;
pub mod asset;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod order;
pub mod req;
pub mod server;
pub mod utils;
pub mod validation;
