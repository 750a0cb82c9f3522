use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FeeSchedule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    #[default]
    #[serde(rename = "BankAccount", alias = "basic")]
    Basic,
    #[serde(rename = "InterestRewardAcct", alias = "interest")]
    InterestReward,
    #[serde(rename = "SavingsAcct", alias = "savings")]
    Savings,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Basic => "BankAccount",
            AccountKind::InterestReward => "InterestRewardAcct",
            AccountKind::Savings => "SavingsAcct",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEventKind {
    Deposited,
    Withdrawn,
    TransferredOut,
    TransferredIn,
}

/// Validated balance change for a single account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountEvent {
    pub account: String,
    pub kind: AccountEventKind,
    /// Amount as requested by the caller, which is what gets logged.
    pub amount: Decimal,
    pub fee: Decimal,
    /// Signed change applied to the balance.
    pub balance_change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Not enough funds in '{name}'. Balance: ${balance:.2}")]
pub struct InsufficientFunds {
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountError {
    #[error("Withdrawal interrupted: {0}")]
    Withdraw(#[source] InsufficientFunds),
    #[error("Transfer interrupted: {0}")]
    Transfer(#[source] InsufficientFunds),
    #[error("Amount is too large for '{name}'")]
    Overflow { name: String },
}

impl AccountError {
    pub fn insufficient_funds(&self) -> Option<&InsufficientFunds> {
        match self {
            AccountError::Withdraw(err) | AccountError::Transfer(err) => Some(err),
            AccountError::Overflow { .. } => None,
        }
    }

    /// Re-wraps an insufficient funds failure as a transfer failure.
    pub fn into_transfer(self) -> Self {
        match self {
            AccountError::Withdraw(err) | AccountError::Transfer(err) => {
                AccountError::Transfer(err)
            }
            err @ AccountError::Overflow { .. } => err,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    name: String,
    balance: Decimal,
    kind: AccountKind,
}

impl Account {
    pub fn new(name: impl Into<String>, kind: AccountKind, balance: Decimal) -> Self {
        Self {
            name: name.into(),
            balance,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn apply(&mut self, event: &AccountEvent) {
        debug_assert_eq!(event.account, self.name);
        self.balance += event.balance_change;
    }

    /// Checks that the balance covers `amount`.
    pub fn viable_transaction(&self, amount: Decimal) -> Result<(), InsufficientFunds> {
        if self.balance >= amount {
            Ok(())
        } else {
            Err(InsufficientFunds {
                name: self.name.clone(),
                balance: self.balance,
            })
        }
    }

    fn overflow(&self) -> AccountError {
        AccountError::Overflow {
            name: self.name.clone(),
        }
    }

    pub fn deposit(
        &self,
        amount: Decimal,
        premium: bool,
        fees: &FeeSchedule,
    ) -> Result<AccountEvent, AccountError> {
        let credited = match self.kind {
            AccountKind::Basic => Some(amount),
            AccountKind::InterestReward | AccountKind::Savings => {
                amount.checked_mul(fees.interest_multiplier(premium))
            }
        };
        // the new balance has to be representable too
        let credited = credited
            .filter(|credited| self.balance.checked_add(*credited).is_some())
            .ok_or_else(|| self.overflow())?;
        Ok(AccountEvent {
            account: self.name.clone(),
            kind: AccountEventKind::Deposited,
            amount,
            fee: Decimal::ZERO,
            balance_change: credited,
        })
    }

    pub fn withdraw(
        &self,
        amount: Decimal,
        premium: bool,
        fees: &FeeSchedule,
    ) -> Result<AccountEvent, AccountError> {
        let fee = match self.kind {
            AccountKind::Basic | AccountKind::InterestReward => Some(Decimal::ZERO),
            AccountKind::Savings => fees
                .percentage_fee(amount, premium)
                .and_then(|fee| fee.checked_add(fees.savings_withdrawal_fee)),
        };
        let fee = fee.ok_or_else(|| self.overflow())?;
        let total_due = amount.checked_add(fee).ok_or_else(|| self.overflow())?;
        self.viable_transaction(total_due).map_err(AccountError::Withdraw)?;
        Ok(AccountEvent {
            account: self.name.clone(),
            kind: AccountEventKind::Withdrawn,
            amount,
            fee,
            balance_change: -total_due,
        })
    }
}
