use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PremiumError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Premium membership period must be positive")]
    EmptyPeriod,
    #[error("Premium membership starting at {since} would end out of the supported date range")]
    ExpiryOutOfRange { since: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumStatus {
    pub username: String,
    pub since: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl PremiumStatus {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

/// Premium membership records, keyed by username.
pub trait PremiumStore {
    fn find(&self, username: &str) -> Result<Option<PremiumStatus>, StoreError>;

    /// Returns `false` when a record for the user already exists.
    fn insert_if_absent(&mut self, status: PremiumStatus) -> Result<bool, StoreError>;

    fn replace(&mut self, status: PremiumStatus) -> Result<(), StoreError>;
}

pub struct PremiumPolicy<P> {
    store: P,
    period: Duration,
}

impl<P> PremiumPolicy<P>
where
    P: PremiumStore,
{
    pub fn new(store: P, period: Duration) -> Self {
        Self { store, period }
    }

    pub fn status(&self, username: &str) -> Result<Option<PremiumStatus>, StoreError> {
        self.store.find(username)
    }

    pub fn is_premium(&self, username: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self
            .store
            .find(username)?
            .is_some_and(|status| status.is_active(now)))
    }

    /// Starts a new membership period.
    ///
    /// Returns `false` if the user already has an active membership; it is not
    /// extended. A lapsed membership is replaced by a fresh period.
    pub fn upgrade(&mut self, username: &str, now: DateTime<Utc>) -> Result<bool, PremiumError> {
        if self.period <= Duration::zero() {
            return Err(PremiumError::EmptyPeriod);
        }
        let expiry = now
            .checked_add_signed(self.period)
            .ok_or(PremiumError::ExpiryOutOfRange { since: now })?;
        let status = PremiumStatus {
            username: username.to_owned(),
            since: now,
            expiry,
        };
        match self.store.find(username)? {
            None => {
                if !self.store.insert_if_absent(status)? {
                    return Ok(false);
                }
            }
            Some(existing) if existing.is_active(now) => return Ok(false),
            Some(_) => self.store.replace(status)?,
        }
        info!(username, "premium membership activated");
        Ok(true)
    }

    /// Whole days until expiry, `None` if the user isn't premium.
    pub fn days_left(&self, username: &str, now: DateTime<Utc>) -> Result<Option<i64>, StoreError> {
        Ok(self
            .store
            .find(username)?
            .filter(|status| status.is_active(now))
            .map(|status| (status.expiry - now).num_days()))
    }

    pub fn expires_within(
        &self,
        username: &str,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Result<bool, StoreError> {
        Ok(self
            .store
            .find(username)?
            .is_some_and(|status| status.is_active(now) && status.expiry - now <= window))
    }
}
