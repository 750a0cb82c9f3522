//! Paired withdraw + deposit across two accounts.
//!
//! Both legs are validated up front and produced as events, so nothing is
//! mutated unless the whole transfer can go through.

use rust_decimal::Decimal;

use crate::{
    account::{Account, AccountError, AccountEvent, AccountEventKind},
    config::FeeSchedule,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan {
    /// Nominal transfer fee. Annotated on the sender's ledger line, not charged.
    pub fee: Decimal,
    pub debit: AccountEvent,
    pub credit: AccountEvent,
}

impl TransferPlan {
    pub fn into_events(self) -> [AccountEvent; 2] {
        [self.debit, self.credit]
    }
}

/// Plans a transfer of `amount` from `sender` to `receiver`.
///
/// Premium flags are those of each account's owner at call time.
pub fn plan_transfer(
    sender: &Account,
    receiver: &Account,
    amount: Decimal,
    sender_premium: bool,
    receiver_premium: bool,
    fees: &FeeSchedule,
) -> Result<TransferPlan, AccountError> {
    let overflow = || AccountError::Overflow {
        name: sender.name().to_owned(),
    };
    let fee = fees.percentage_fee(amount, sender_premium).ok_or_else(overflow)?;
    sender.viable_transaction(amount).map_err(AccountError::Transfer)?;

    // the sender's variant re-validates with its own withdrawal rule
    let withdrawn = sender
        .withdraw(amount, sender_premium, fees)
        .map_err(AccountError::into_transfer)?;
    let deposited = receiver.deposit(amount, receiver_premium, fees)?;
    let logged_fee = withdrawn.fee.checked_add(fee).ok_or_else(overflow)?;

    Ok(TransferPlan {
        fee,
        debit: AccountEvent {
            kind: AccountEventKind::TransferredOut,
            fee: logged_fee,
            ..withdrawn
        },
        credit: AccountEvent {
            kind: AccountEventKind::TransferredIn,
            ..deposited
        },
    })
}
