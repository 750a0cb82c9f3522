use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::{Account, AccountKind};

pub mod file;
pub mod in_memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Stored as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    #[serde(rename = "type")]
    pub kind: AccountKind,
}

/// Persisted mapping from account name to balance and variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerSnapshot {
    pub accounts: BTreeMap<String, AccountRecord>,
}

impl LedgerSnapshot {
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|acc| {
                    (
                        acc.name().to_owned(),
                        AccountRecord {
                            balance: acc.balance(),
                            kind: acc.kind(),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn into_accounts(self) -> impl Iterator<Item = Account> {
        self.accounts
            .into_iter()
            .map(|(name, record)| Account::new(name, record.kind, record.balance))
    }
}

/// Per-user account snapshots, read and written wholesale.
pub trait LedgerStore {
    /// Returns an empty snapshot for users that have none yet.
    fn load(&self, username: &str) -> Result<LedgerSnapshot, StoreError>;

    fn save(&mut self, username: &str, snapshot: &LedgerSnapshot) -> Result<(), StoreError>;
}
