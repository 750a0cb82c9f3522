//! File-backed stores under a single data directory.
//!
//! Layout:
//! - `accounts_<username>.json` ledger snapshot per user
//! - `transactions.csv` shared transaction log
//! - `premium_members.json` premium memberships

use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    premium::{PremiumStatus, PremiumStore},
    recorder::{TransactionLog, TransactionRecord, newest_first},
};

use super::{LedgerSnapshot, LedgerStore, StoreError};

fn read_json<T>(path: &Path) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Replaces the file in one step, so readers never see a half-written file.
fn write_json<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    dir: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, username: &str) -> PathBuf {
        self.dir.join(format!("accounts_{username}.json"))
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self, username: &str) -> Result<LedgerSnapshot, StoreError> {
        Ok(read_json(&self.path_for(username))?.unwrap_or_default())
    }

    fn save(&mut self, username: &str, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        write_json(&self.path_for(username), snapshot)
    }
}

#[derive(Debug, Clone)]
pub struct CsvTransactionLog {
    path: PathBuf,
}

impl CsvTransactionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionLog for CsvTransactionLog {
    fn append(&mut self, record: TransactionRecord) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_headers = file.metadata()?.len() == 0;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_headers)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    fn recent(&self, username: &str, limit: usize) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(err) => match err.kind() {
                csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound => {
                    return Ok(Vec::new());
                }
                _ => return Err(err.into()),
            },
        };
        let mut records = Vec::new();
        for row in reader.deserialize::<TransactionRecord>() {
            let row = row?;
            if row.username == username {
                records.push(row);
            }
        }
        Ok(newest_first(records, limit))
    }
}

#[derive(Debug, Clone)]
pub struct JsonPremiumStore {
    path: PathBuf,
}

impl JsonPremiumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_all(&self) -> Result<BTreeMap<String, PremiumStatus>, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

impl PremiumStore for JsonPremiumStore {
    fn find(&self, username: &str) -> Result<Option<PremiumStatus>, StoreError> {
        Ok(self.load_all()?.remove(username))
    }

    fn insert_if_absent(&mut self, status: PremiumStatus) -> Result<bool, StoreError> {
        let mut members = self.load_all()?;
        if members.contains_key(&status.username) {
            return Ok(false);
        }
        members.insert(status.username.clone(), status);
        write_json(&self.path, &members)?;
        Ok(true)
    }

    fn replace(&mut self, status: PremiumStatus) -> Result<(), StoreError> {
        let mut members = self.load_all()?;
        members.insert(status.username.clone(), status);
        write_json(&self.path, &members)
    }
}
