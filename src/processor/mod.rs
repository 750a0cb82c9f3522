use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::AccountError,
    command::{AccountCommandError, LedgerCommand},
    config::ConfigError,
    premium::PremiumError,
    store::StoreError,
};

pub mod session;

#[derive(Debug, Error)]
pub enum TransactionProcessError {
    #[error(transparent)]
    CommandErr(#[from] AccountCommandError),
    #[error(transparent)]
    AccountErr(#[from] AccountError),
    #[error("Account '{0}' does not exist")]
    UnknownAccount(String),
    #[error("Account with name '{0}' already exists")]
    DuplicateAccount(String),
    #[error("Failed to persist ledger: {0}")]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Premium upgrade failed: {0}")]
    Premium(#[from] PremiumError),
}

#[derive(Debug)]
pub enum Outcome {
    AccountOpened {
        account: String,
        balance: Decimal,
    },
    /// Committed balance change. `log_failures` lists transaction records that
    /// could not be written; the balances stand regardless.
    BalancesChanged {
        balances: Vec<(String, Decimal)>,
        log_failures: Vec<StoreError>,
    },
    PremiumUpgrade {
        activated: bool,
    },
}

pub trait TransactionProcessor {
    fn process_command(&mut self, command: LedgerCommand)
    -> Result<Outcome, TransactionProcessError>;
}
