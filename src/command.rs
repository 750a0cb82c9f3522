use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::account::AccountKind;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
    Upgrade,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerCommand {
    OpenAccount {
        name: String,
        kind: AccountKind,
        initial_balance: Decimal,
    },
    Deposit {
        account: String,
        amount: Decimal,
    },
    Withdraw {
        account: String,
        amount: Decimal,
    },
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },
    UpgradePremium,
}

#[derive(Debug, Error)]
pub enum AccountCommandError {
    #[error("Amount is required for {action:?}")]
    AmountRequired { action: OperationKind },
    #[error("Amount must not be negative for {action:?}")]
    NegativeAmount { action: OperationKind },
    #[error("Account name is required for {action:?}")]
    AccountRequired { action: OperationKind },
    #[error("Transfer needs a receiving account")]
    ReceiverRequired,
    #[error("Cannot transfer from '{account}' to itself")]
    SelfTransfer { account: String },
}

impl LedgerCommand {
    pub fn parse_command(
        action: OperationKind,
        account: Option<String>,
        amount: Option<Decimal>,
        target: Option<String>,
        kind: Option<AccountKind>,
    ) -> Result<Self, AccountCommandError> {
        match action {
            OperationKind::Open => Ok(Self::OpenAccount {
                name: Self::require_account(account, action)?,
                kind: kind.unwrap_or_default(),
                // accounts may be opened empty
                initial_balance: Self::parse_amount(amount.or(Some(Decimal::ZERO)), action)?,
            }),
            OperationKind::Deposit => Ok(Self::Deposit {
                account: Self::require_account(account, action)?,
                amount: Self::parse_amount(amount, action)?,
            }),
            OperationKind::Withdraw => Ok(Self::Withdraw {
                account: Self::require_account(account, action)?,
                amount: Self::parse_amount(amount, action)?,
            }),
            OperationKind::Transfer => {
                let from = Self::require_account(account, action)?;
                let to = target
                    .filter(|to| !to.is_empty())
                    .ok_or(AccountCommandError::ReceiverRequired)?;
                if from == to {
                    return Err(AccountCommandError::SelfTransfer { account: from });
                }
                Ok(Self::Transfer {
                    from,
                    to,
                    amount: Self::parse_amount(amount, action)?,
                })
            }
            OperationKind::Upgrade => Ok(Self::UpgradePremium),
        }
    }

    fn require_account(
        account: Option<String>,
        action: OperationKind,
    ) -> Result<String, AccountCommandError> {
        account
            .filter(|name| !name.is_empty())
            .ok_or(AccountCommandError::AccountRequired { action })
    }

    fn parse_amount(
        amount: Option<Decimal>,
        action: OperationKind,
    ) -> Result<Decimal, AccountCommandError> {
        let Some(amount) = amount else {
            return Err(AccountCommandError::AmountRequired { action });
        };
        ensure_non_negative(amount, action)?;
        Ok(amount)
    }
}

pub(crate) fn ensure_non_negative(
    amount: Decimal,
    action: OperationKind,
) -> Result<(), AccountCommandError> {
    if amount < Decimal::ZERO {
        return Err(AccountCommandError::NegativeAmount { action });
    }
    Ok(())
}
