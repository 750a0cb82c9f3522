use std::{collections::BTreeMap, sync::Arc};

use chrono::Duration;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    account::{Account, AccountEvent, AccountKind},
    clock::Clock,
    command::{AccountCommandError, LedgerCommand, OperationKind, ensure_non_negative},
    config::LedgerConfig,
    premium::{PremiumError, PremiumPolicy, PremiumStore},
    recorder::{TransactionLog, TransactionRecord, TransactionRecorder},
    store::{LedgerSnapshot, LedgerStore, StoreError},
    transfer::plan_transfer,
};

use super::{Outcome, TransactionProcessError, TransactionProcessor};

/// Storage collaborators of a session.
pub struct Stores<L, T, P> {
    pub ledger: L,
    pub log: T,
    pub premium: P,
}

/// One user's accounts, loaded at start and persisted after every change.
pub struct Session<L, T, P> {
    username: String,
    accounts: BTreeMap<String, Account>,
    ledger: L,
    recorder: TransactionRecorder<T>,
    premium: PremiumPolicy<P>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl<L, T, P> Session<L, T, P>
where
    L: LedgerStore,
    T: TransactionLog,
    P: PremiumStore,
{
    pub fn open(
        username: impl Into<String>,
        stores: Stores<L, T, P>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Result<Self, TransactionProcessError> {
        let period = config.premium_period()?;
        let username = username.into();
        let accounts = stores
            .ledger
            .load(&username)?
            .into_accounts()
            .map(|acc| (acc.name().to_owned(), acc))
            .collect();
        Ok(Self {
            username,
            accounts,
            ledger: stores.ledger,
            recorder: TransactionRecorder::new(stores.log, clock.clone()),
            premium: PremiumPolicy::new(stores.premium, period),
            clock,
            config,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn balance(&self, name: &str) -> Option<Decimal> {
        self.accounts.get(name).map(Account::balance)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn transaction_log(&self) -> &T {
        self.recorder.log()
    }

    pub fn premium(&self) -> &PremiumPolicy<P> {
        &self.premium
    }

    pub fn is_premium(&self) -> Result<bool, StoreError> {
        self.premium.is_premium(&self.username, self.clock.now())
    }

    /// Whole days of premium membership left, `None` when not premium.
    pub fn premium_days_left(&self) -> Result<Option<i64>, StoreError> {
        self.premium.days_left(&self.username, self.clock.now())
    }

    pub fn premium_expires_within(&self, window: Duration) -> Result<bool, StoreError> {
        self.premium
            .expires_within(&self.username, self.clock.now(), window)
    }

    /// Most recent transactions of this user, newest first.
    pub fn history(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        self.recorder
            .recent(&self.username, self.config.history_limit)
    }

    pub fn upgrade(&mut self) -> Result<bool, PremiumError> {
        self.premium.upgrade(&self.username, self.clock.now())
    }

    pub fn open_account(
        &mut self,
        name: &str,
        kind: AccountKind,
        initial_balance: Decimal,
    ) -> Result<&Account, TransactionProcessError> {
        ensure_non_negative(initial_balance, OperationKind::Open)?;
        if self.accounts.contains_key(name) {
            return Err(TransactionProcessError::DuplicateAccount(name.to_owned()));
        }
        self.accounts
            .insert(name.to_owned(), Account::new(name, kind, initial_balance));
        if let Err(err) = self.persist() {
            self.accounts.remove(name);
            return Err(err.into());
        }
        info!(
            username = %self.username,
            account = name,
            kind = kind.as_str(),
            %initial_balance,
            "account opened"
        );
        self.accounts
            .get(name)
            .ok_or_else(|| TransactionProcessError::UnknownAccount(name.to_owned()))
    }

    fn get(&self, name: &str) -> Result<&Account, TransactionProcessError> {
        self.accounts
            .get(name)
            .ok_or_else(|| TransactionProcessError::UnknownAccount(name.to_owned()))
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let snapshot = LedgerSnapshot::from_accounts(self.accounts.values());
        self.ledger.save(&self.username, &snapshot)
    }

    /// Applies all events, persists the snapshot and records the transactions.
    ///
    /// Nothing stays applied if the snapshot can't be saved. Failing to record a
    /// transaction doesn't undo the committed balances.
    fn commit(&mut self, events: &[AccountEvent]) -> Result<Outcome, TransactionProcessError> {
        let previous = self.accounts.clone();
        for event in events {
            match self.accounts.get_mut(&event.account) {
                Some(acc) => acc.apply(event),
                None => {
                    self.accounts = previous;
                    return Err(TransactionProcessError::UnknownAccount(
                        event.account.clone(),
                    ));
                }
            }
        }
        if let Err(err) = self.persist() {
            warn!(username = %self.username, error = %err, "rolling back, ledger not saved");
            self.accounts = previous;
            return Err(err.into());
        }

        let mut log_failures = Vec::new();
        for event in events {
            debug!(
                username = %self.username,
                account = %event.account,
                kind = ?event.kind,
                amount = %event.amount,
                fee = %event.fee,
                "committed"
            );
            if let Err(err) = self.recorder.record_event(&self.username, event) {
                warn!(account = %event.account, error = %err, "failed to record transaction");
                log_failures.push(err);
            }
        }

        let mut balances: Vec<(String, Decimal)> = Vec::with_capacity(events.len());
        for event in events {
            if let Some(balance) = self.balance(&event.account) {
                balances.push((event.account.clone(), balance));
            }
        }
        Ok(Outcome::BalancesChanged {
            balances,
            log_failures,
        })
    }
}

impl<L, T, P> TransactionProcessor for Session<L, T, P>
where
    L: LedgerStore,
    T: TransactionLog,
    P: PremiumStore,
{
    fn process_command(
        &mut self,
        command: LedgerCommand,
    ) -> Result<Outcome, TransactionProcessError> {
        match command {
            LedgerCommand::OpenAccount {
                name,
                kind,
                initial_balance,
            } => {
                let balance = self.open_account(&name, kind, initial_balance)?.balance();
                Ok(Outcome::AccountOpened {
                    account: name,
                    balance,
                })
            }
            LedgerCommand::Deposit { account, amount } => {
                ensure_non_negative(amount, OperationKind::Deposit)?;
                let premium = self.is_premium()?;
                let event = self
                    .get(&account)?
                    .deposit(amount, premium, &self.config.fees)?;
                self.commit(&[event])
            }
            LedgerCommand::Withdraw { account, amount } => {
                ensure_non_negative(amount, OperationKind::Withdraw)?;
                let premium = self.is_premium()?;
                let event = self
                    .get(&account)?
                    .withdraw(amount, premium, &self.config.fees)?;
                self.commit(&[event])
            }
            LedgerCommand::Transfer { from, to, amount } => {
                ensure_non_negative(amount, OperationKind::Transfer)?;
                if from == to {
                    return Err(AccountCommandError::SelfTransfer { account: from }.into());
                }
                // both accounts belong to the session user
                let premium = self.is_premium()?;
                let plan = plan_transfer(
                    self.get(&from)?,
                    self.get(&to)?,
                    amount,
                    premium,
                    premium,
                    &self.config.fees,
                )?;
                self.commit(&plan.into_events())
            }
            LedgerCommand::UpgradePremium => Ok(Outcome::PremiumUpgrade {
                activated: self.upgrade()?,
            }),
        }
    }
}
