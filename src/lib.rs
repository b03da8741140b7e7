pub mod access;
pub mod admin;
pub mod config;
pub mod device;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod identity;
pub mod ingestion;
pub mod ledger;
pub mod output;
pub mod platform;
pub mod quiz;
pub mod referral;
pub mod reports;
pub mod session;
pub mod storage;
pub mod withdrawals;

pub use config::LedgerConfig;
pub use domain::Error;
pub use platform::Platform;
