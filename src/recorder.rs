use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    account::{AccountEvent, AccountEventKind},
    clock::Clock,
    store::StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
}

impl From<AccountEventKind> for TransactionType {
    fn from(kind: AccountEventKind) -> Self {
        match kind {
            AccountEventKind::Deposited => TransactionType::Deposit,
            AccountEventKind::Withdrawn => TransactionType::Withdraw,
            AccountEventKind::TransferredOut => TransactionType::TransferOut,
            AccountEventKind::TransferredIn => TransactionType::TransferIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub username: String,
    pub account: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Append-only transaction log.
pub trait TransactionLog {
    fn append(&mut self, record: TransactionRecord) -> Result<(), StoreError>;

    /// The user's most recent records, newest first. Records with equal
    /// timestamps come back in reverse insertion order.
    fn recent(&self, username: &str, limit: usize) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// Orders records in insertion order newest first and keeps `limit` of them.
pub(crate) fn newest_first(
    mut records: Vec<TransactionRecord>,
    limit: usize,
) -> Vec<TransactionRecord> {
    records.reverse();
    // stable sort keeps the reversed insertion order for equal timestamps
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

pub struct TransactionRecorder<T> {
    log: T,
    clock: Arc<dyn Clock>,
}

impl<T> TransactionRecorder<T>
where
    T: TransactionLog,
{
    pub fn new(log: T, clock: Arc<dyn Clock>) -> Self {
        Self { log, clock }
    }

    pub fn log(&self) -> &T {
        &self.log
    }

    pub fn record(
        &mut self,
        username: &str,
        account: &str,
        kind: TransactionType,
        amount: Decimal,
        fee: Decimal,
    ) -> Result<(), StoreError> {
        self.log.append(TransactionRecord {
            username: username.to_owned(),
            account: account.to_owned(),
            kind,
            amount,
            fee,
            timestamp: self.clock.now(),
        })
    }

    pub fn record_event(&mut self, username: &str, event: &AccountEvent) -> Result<(), StoreError> {
        self.record(
            username,
            &event.account,
            event.kind.into(),
            event.amount,
            event.fee,
        )
    }

    pub fn recent(&self, username: &str, limit: usize) -> Result<Vec<TransactionRecord>, StoreError> {
        self.log.recent(username, limit)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{clock::ManualClock, store::in_memory::InMemoryTransactionLog};

    #[test]
    fn records_are_returned_newest_first() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap(),
        ));
        let mut recorder = TransactionRecorder::new(InMemoryTransactionLog::default(), clock.clone());

        recorder
            .record("alice", "main", TransactionType::Deposit, dec!(10), Decimal::ZERO)
            .unwrap();
        clock.advance(Duration::minutes(1));
        recorder
            .record("alice", "main", TransactionType::Withdraw, dec!(3), Decimal::ZERO)
            .unwrap();
        // same timestamp as the withdrawal, inserted later
        recorder
            .record("alice", "main", TransactionType::TransferOut, dec!(2), dec!(0.02))
            .unwrap();
        recorder
            .record("bob", "main", TransactionType::Deposit, dec!(99), Decimal::ZERO)
            .unwrap();

        let history = recorder.recent("alice", 20).unwrap();
        let kinds: Vec<TransactionType> = history.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                TransactionType::TransferOut,
                TransactionType::Withdraw,
                TransactionType::Deposit
            ]
        );
        assert_eq!(history[0].fee, dec!(0.02));

        let limited = recorder.recent("alice", 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].kind, TransactionType::TransferOut);
    }

    #[test]
    fn record_event_uses_logged_amount() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap(),
        ));
        let mut recorder = TransactionRecorder::new(InMemoryTransactionLog::default(), clock);
        let event = AccountEvent {
            account: "interest".to_owned(),
            kind: AccountEventKind::Deposited,
            amount: dec!(100),
            fee: Decimal::ZERO,
            balance_change: dec!(105),
        };
        recorder.record_event("dave", &event).unwrap();
        let history = recorder.recent("dave", 20).unwrap();
        assert_eq!(history[0].amount, dec!(100));
        assert_eq!(history[0].kind, TransactionType::Deposit);
        assert_eq!(history[0].account, "interest");
    }

    #[test]
    fn type_tags() {
        assert_eq!(
            serde_json::to_string(&TransactionType::TransferOut).unwrap(),
            r#""transfer-out""#
        );
    }
}
