use std::collections::{HashMap, hash_map::Entry};

use crate::{
    premium::{PremiumStatus, PremiumStore},
    recorder::{TransactionLog, TransactionRecord, newest_first},
};

use super::{LedgerSnapshot, LedgerStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    pub snapshots: HashMap<String, LedgerSnapshot>,
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self, username: &str) -> Result<LedgerSnapshot, StoreError> {
        Ok(self.snapshots.get(username).cloned().unwrap_or_default())
    }

    fn save(&mut self, username: &str, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        self.snapshots.insert(username.to_owned(), snapshot.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTransactionLog {
    pub records: Vec<TransactionRecord>,
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&mut self, record: TransactionRecord) -> Result<(), StoreError> {
        self.records.push(record);
        Ok(())
    }

    fn recent(&self, username: &str, limit: usize) -> Result<Vec<TransactionRecord>, StoreError> {
        let records = self
            .records
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect();
        Ok(newest_first(records, limit))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPremiumStore {
    pub members: HashMap<String, PremiumStatus>,
}

impl PremiumStore for InMemoryPremiumStore {
    fn find(&self, username: &str) -> Result<Option<PremiumStatus>, StoreError> {
        Ok(self.members.get(username).cloned())
    }

    fn insert_if_absent(&mut self, status: PremiumStatus) -> Result<bool, StoreError> {
        match self.members.entry(status.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(status);
                Ok(true)
            }
        }
    }

    fn replace(&mut self, status: PremiumStatus) -> Result<(), StoreError> {
        self.members.insert(status.username.clone(), status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::account::{Account, AccountKind};

    #[test]
    fn ledger_snapshots_are_per_user() {
        let mut store = InMemoryLedgerStore::default();
        assert!(store.load("alice").unwrap().accounts.is_empty());
        let snapshot =
            LedgerSnapshot::from_accounts(&[Account::new("main", AccountKind::Basic, dec!(5))]);
        store.save("alice", &snapshot).unwrap();
        assert_eq!(store.load("alice").unwrap(), snapshot);
        assert!(store.load("bob").unwrap().accounts.is_empty());
    }

    #[test]
    fn premium_insert_if_absent() {
        let mut store = InMemoryPremiumStore::default();
        let since = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let status = PremiumStatus {
            username: "carol".to_owned(),
            since,
            expiry: since + Duration::days(30),
        };
        assert!(store.insert_if_absent(status.clone()).unwrap());
        assert!(!store.insert_if_absent(status.clone()).unwrap());
        assert_eq!(store.find("carol").unwrap(), Some(status));
    }
}
